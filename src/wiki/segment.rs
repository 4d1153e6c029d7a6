//! Single-pass classification of text into protected and plain spans.
//!
//! Link insertion only ever touches [`Segment::Plain`]. Everything else is
//! emitted byte for byte, which is what keeps generated anchors, code and
//! existing `[[...]]` references from being rewritten twice.
//!
//! At any position the candidates are tried in a fixed order: markup
//! (tags and character references), wiki link, fenced code, inline code.
//! The first that matches wins and scanning resumes after it.

/// Elements whose whole body is protected, not just the opening tag.
const OPAQUE_ELEMENTS: [&str; 3] = ["a", "code", "pre"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A tag `<...>`, a whole `<a>`, `<code>` or `<pre>` element, or a
    /// character reference such as `&amp;`.
    Markup(&'a str),
    /// `[[target]]` on a single line. `target` may be empty.
    WikiLink { raw: &'a str, target: &'a str },
    /// ```` ```...``` ````, possibly spanning lines.
    FencedCode(&'a str),
    /// `` `...` `` with at least one character inside.
    InlineCode(&'a str),
    Plain(&'a str),
}

impl<'a> Segment<'a> {
    /// The exact source text of this segment.
    pub fn as_str(&self) -> &'a str {
        match *self {
            Segment::Markup(s)
            | Segment::FencedCode(s)
            | Segment::InlineCode(s)
            | Segment::Plain(s) => s,
            Segment::WikiLink { raw, .. } => raw,
        }
    }
}

/// Split `text` into segments. Concatenating `as_str()` of the result gives
/// back `text` exactly.
pub fn tokenize(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    // Every trigger byte is ASCII, so `i` is a char boundary whenever a
    // candidate matches.
    while i < bytes.len() {
        let found = match bytes[i] {
            b'<' => markup_end(text, i).map(|end| (Segment::Markup(&text[i..end]), end)),
            b'&' => reference_end(text, i).map(|end| (Segment::Markup(&text[i..end]), end)),
            b'[' => wiki_link_end(text, i).map(|end| {
                let raw = &text[i..end];
                (Segment::WikiLink { raw, target: &raw[2..raw.len() - 2] }, end)
            }),
            b'`' => fenced_end(text, i)
                .map(|end| (Segment::FencedCode(&text[i..end]), end))
                .or_else(|| inline_end(text, i).map(|end| (Segment::InlineCode(&text[i..end]), end))),
            _ => None,
        };

        match found {
            Some((segment, end)) => {
                if plain_start < i {
                    segments.push(Segment::Plain(&text[plain_start..i]));
                }
                segments.push(segment);
                i = end;
                plain_start = end;
            }
            None => i += 1,
        }
    }

    if plain_start < bytes.len() {
        segments.push(Segment::Plain(&text[plain_start..]));
    }
    segments
}

fn markup_end(text: &str, start: usize) -> Option<usize> {
    let close = text[start + 1..].find('>')?;
    if close == 0 {
        return None;
    }
    let tag_end = start + 1 + close + 1;
    let tag = &text[start + 1..tag_end - 1];

    let name_len = tag.bytes().take_while(u8::is_ascii_alphanumeric).count();
    let name = &tag[..name_len];
    let opaque = OPAQUE_ELEMENTS.iter().any(|e| e.eq_ignore_ascii_case(name));
    if !opaque || tag.ends_with('/') {
        return Some(tag_end);
    }
    Some(closing_tag_end(text, tag_end, name).unwrap_or(tag_end))
}

/// End of the first `</name ...>` at or after `from`, matched
/// case-insensitively.
fn closing_tag_end(text: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = name.len() + 2;
    let mut i = from;
    while i + needle <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1] == b'/'
            && bytes[i + 2..i + needle].eq_ignore_ascii_case(name.as_bytes())
            && !bytes.get(i + needle).is_some_and(u8::is_ascii_alphanumeric)
        {
            let gt = text[i + needle..].find('>')?;
            return Some(i + needle + gt + 1);
        }
        i += 1;
    }
    None
}

/// `&name;`, `&#NN;` or `&#xHH;`.
fn reference_end(text: &str, start: usize) -> Option<usize> {
    let body = &text.as_bytes()[start + 1..];
    let (digits, accepts): (&[u8], fn(&u8) -> bool) = match body {
        [b'#', b'x' | b'X', rest @ ..] => (rest, u8::is_ascii_hexdigit),
        [b'#', rest @ ..] => (rest, u8::is_ascii_digit),
        [first, ..] if first.is_ascii_alphabetic() => (body, u8::is_ascii_alphanumeric),
        _ => return None,
    };
    let len = digits.iter().take_while(|&b| accepts(b)).count();
    if len == 0 || digits.get(len) != Some(&b';') {
        return None;
    }
    let prefix = body.len() - digits.len();
    Some(start + 1 + prefix + len + 1)
}

fn wiki_link_end(text: &str, start: usize) -> Option<usize> {
    let rest = text[start..].strip_prefix("[[")?;
    let close = rest.find("]]")?;
    if rest[..close].contains('\n') {
        return None;
    }
    Some(start + 2 + close + 2)
}

fn fenced_end(text: &str, start: usize) -> Option<usize> {
    let rest = text[start..].strip_prefix("```")?;
    let close = rest.find("```")?;
    Some(start + 3 + close + 3)
}

fn inline_end(text: &str, start: usize) -> Option<usize> {
    let close = text[start + 1..].find('`')?;
    if close == 0 {
        return None;
    }
    Some(start + 1 + close + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(segments: &[Segment<'_>]) -> String {
        segments.iter().map(Segment::as_str).collect()
    }

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(tokenize("just words"), vec![Segment::Plain("just words")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn classifies_each_kind() {
        let text = "a <b>bold</b> [[Page]] ```x = 1``` `y` z";
        let segments = tokenize(text);
        assert_eq!(
            segments,
            vec![
                Segment::Plain("a "),
                Segment::Markup("<b>"),
                Segment::Plain("bold"),
                Segment::Markup("</b>"),
                Segment::Plain(" "),
                Segment::WikiLink { raw: "[[Page]]", target: "Page" },
                Segment::Plain(" "),
                Segment::FencedCode("```x = 1```"),
                Segment::Plain(" "),
                Segment::InlineCode("`y`"),
                Segment::Plain(" z"),
            ]
        );
        assert_eq!(rebuild(&segments), text);
    }

    #[test]
    fn anchors_and_code_elements_are_whole_spans() {
        let text = r#"see <a href="/x">Alpha</a> and <PRE><code>Alpha</code></Pre> end"#;
        let segments = tokenize(text);
        assert_eq!(segments[1], Segment::Markup(r#"<a href="/x">Alpha</a>"#));
        assert_eq!(segments[3], Segment::Markup("<PRE><code>Alpha</code></Pre>"));
        assert_eq!(rebuild(&segments), text);
    }

    #[test]
    fn similar_tag_names_are_not_opaque() {
        let segments = tokenize("<abbr>Alpha</abbr>");
        assert_eq!(segments[0], Segment::Markup("<abbr>"));
        assert_eq!(segments[1], Segment::Plain("Alpha"));
    }

    #[test]
    fn unclosed_anchor_protects_only_the_tag() {
        let segments = tokenize("<a href=\"/x\">Alpha");
        assert_eq!(segments, vec![Segment::Markup("<a href=\"/x\">"), Segment::Plain("Alpha")]);
    }

    #[test]
    fn wiki_links_stay_on_one_line() {
        assert_eq!(tokenize("[[a\nb]]"), vec![Segment::Plain("[[a\nb]]")]);
        assert_eq!(tokenize("[[]]"), vec![Segment::WikiLink { raw: "[[]]", target: "" }]);
    }

    #[test]
    fn fenced_code_spans_lines_and_beats_inline() {
        let text = "```\n[[Alpha]] `x`\n``` after";
        let segments = tokenize(text);
        assert_eq!(segments[0], Segment::FencedCode("```\n[[Alpha]] `x`\n```"));
        assert_eq!(segments[1], Segment::Plain(" after"));
    }

    #[test]
    fn lone_markers_are_plain() {
        let text = "a < b, [[open, `tick";
        assert_eq!(tokenize(text), vec![Segment::Plain(text)]);
        assert_eq!(tokenize("<>"), vec![Segment::Plain("<>")]);
        assert_eq!(tokenize("``"), vec![Segment::Plain("``")]);
    }

    #[test]
    fn character_references_are_markup() {
        let text = "Tom &amp; Jerry &#39;quoted&#x27; &quot;";
        assert_eq!(
            tokenize(text),
            vec![
                Segment::Plain("Tom "),
                Segment::Markup("&amp;"),
                Segment::Plain(" Jerry "),
                Segment::Markup("&#39;"),
                Segment::Plain("quoted"),
                Segment::Markup("&#x27;"),
                Segment::Plain(" "),
                Segment::Markup("&quot;"),
            ]
        );
    }

    #[test]
    fn bare_ampersands_are_plain() {
        for text in ["R&D", "a & b", "&;", "&#;", "&#xZZ;", "&amp", "&1x;"] {
            assert_eq!(tokenize(text), vec![Segment::Plain(text)], "{text}");
        }
    }

    #[test]
    fn non_ascii_text_round_trips() {
        let text = "日本語 [[メモ]] `コード` <i>斜体</i>";
        assert_eq!(rebuild(&tokenize(text)), text);
    }
}
