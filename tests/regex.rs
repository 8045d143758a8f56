use anyhow::Result;
use dfaregex::lexer::LexError;
use dfaregex::parser::SyntaxError;
use dfaregex::{compile, CompileError, Cursor, Regex};

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// `(match_start, match_length)` of the first match at or after `position`.
fn first(re: &Regex, text: &str, position: usize) -> Option<(usize, usize)> {
    let mut cursor = Cursor::at(position);
    re.match_at(&chars(text), &mut cursor)
        .then(|| (cursor.match_start.unwrap_or_default(), cursor.match_length))
}

fn all(re: &Regex, text: &str) -> Vec<String> {
    let text = chars(text);
    re.find_iter(&text)
        .map(|m| text[m.range()].iter().collect())
        .collect()
}

#[test]
fn digits_resume() -> Result<()> {
    let re = compile("[0-9]+")?;
    assert_eq!(first(&re, "ab12cd345", 0), Some((2, 2)));
    assert_eq!(first(&re, "ab12cd345", 4), Some((6, 3)));
    assert_eq!(first(&re, "ab12cd345", 9), None);
    Ok(())
}

#[test]
fn alternation() -> Result<()> {
    let re = compile("a|b")?;
    assert_eq!(first(&re, "xaybx", 0), Some((1, 1)));
    assert_eq!(all(&re, "xaybx"), ["a", "b"]);
    Ok(())
}

#[test]
fn repeated_group() -> Result<()> {
    let re = compile("(aa|b)+")?;
    assert_eq!(first(&re, "aab", 0), Some((0, 3)));
    assert_eq!(all(&re, "aab ab baab"), ["aab", "b", "baab"]);
    Ok(())
}

#[test]
fn negated_class() -> Result<()> {
    let re = compile("[^abc]+")?;
    assert_eq!(first(&re, "abcxyzabc", 0), Some((3, 3)));

    let re = compile("[^a-cx]+")?;
    assert_eq!(all(&re, "abxdefcxyz"), ["def", "yz"]);
    Ok(())
}

#[test]
fn dot_star() -> Result<()> {
    let re = compile(".*")?;
    for text in ["a", "lorem ipsum", "(.*)", "ñandú"] {
        assert_eq!(first(&re, text, 0), Some((0, text.chars().count())), "{text}");
    }
    Ok(())
}

#[test]
fn syntax_features() -> Result<()> {
    let cases: &[(&str, &str, &[&str])] = &[
        ("lo.*", "hello lorem", &["lo lorem"]),
        ("[A-Z][a-z]+", "Lorem Ipsum dolor", &["Lorem", "Ipsum"]),
        ("[a-zA-Z0-9][0-9]", "a1 bb 22", &["a1", "22"]),
        ("(a|b)c", "ac bc cc", &["ac", "bc"]),
        ("([a-z]|[A-Z])|0+", "A 00 b", &["A", "00", "b"]),
        ("[0-9]*lorem", "12lorem lorem", &["12lorem", "lorem"]),
        ("(a)(a)*.+", "baaac", &["aaac"]),
        ("colou?r", "color colour", &["color", "colour"]),
        ("a b", "ab a b", &["ab"]),
        (r"a\sb", "ab a b", &["a b"]),
        (r"\(\*\)", "(*)", &["(*)"]),
        (r"[\[-z]", "A[z", &["[", "z"]),
        ("x-y", "x-y", &["x-y"]),
        ("]", "a]", &["]"]),
        ("J(avier|uan) Perez", "JuanPerez Juan Perez", &["JuanPerez"]),
    ];

    for &(pattern, text, expected) in cases {
        let re = compile(pattern)?;
        assert_eq!(all(&re, text), expected, "{pattern} on {text:?}");
    }
    Ok(())
}

#[test]
fn overlapping_symbols() -> Result<()> {
    for (pattern, text, expected) in [
        ("a.*b", "axb", Some((0, 3))),
        ("[a-z]+ing", "sing", Some((0, 4))),
        (".*a", "bba", Some((0, 3))),
        ("(a|.)b", "ab", Some((0, 2))),
        ("[a-c]x|[b-d]y", "by", Some((0, 2))),
    ] {
        assert_eq!(first(&compile(pattern)?, text, 0), expected, "{pattern} on {text:?}");
    }
    Ok(())
}

#[test]
fn many_alternatives() -> Result<()> {
    let words: Vec<String> = (0..1_000).map(|i| format!("w{i}")).collect();
    let re = compile(&words.join("|"))?;
    assert!(re.is_match("w999"));
    assert_eq!(all(&re, "w0 w42 w999"), ["w0", "w42", "w999"]);
    assert!(!re.is_match("x12"));
    Ok(())
}

#[test]
fn boundary_errors() {
    for pattern in ["", "   ", "(", ")", "[]", "|a", "a|"] {
        assert!(
            matches!(compile(pattern), Err(CompileError::Syntax(_))),
            "{pattern:?}"
        );
    }
    assert!(matches!(
        compile("[z-a]"),
        Err(CompileError::Syntax(SyntaxError::InvalidRange { .. }))
    ));
    assert!(matches!(
        compile(r"\d"),
        Err(CompileError::Lexical(LexError::InvalidEscape { .. }))
    ));
    assert!(matches!(
        compile("a\u{7}"),
        Err(CompileError::Lexical(LexError::InvalidCharacter { .. }))
    ));
}

#[test]
fn failed_match_leaves_sentinels() -> Result<()> {
    let re = compile("xyz")?;
    let mut cursor = Cursor {
        position: 0,
        match_start: Some(4),
        match_length: 2,
    };
    assert!(!re.match_at(&chars("xy"), &mut cursor));
    assert_eq!(cursor.match_start, None);
    assert_eq!(cursor.match_length, 0);

    assert!(!re.match_at(&[], &mut Cursor::new()));
    Ok(())
}

#[test]
fn shared_across_threads() -> Result<()> {
    let re = compile("[a-z]+")?;
    let text = chars("one two three");

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let mut cursor = Cursor::new();
                let mut words = 0;
                while re.match_at(&text, &mut cursor) {
                    words += 1;
                    cursor.position = cursor.match_end().unwrap_or(text.len());
                }
                assert_eq!(words, 3);
            });
        }
    });
    Ok(())
}
