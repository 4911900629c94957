// Parsing of definition responses into display blocks.
// Lines are classified first, then turned into blocks; styling lives in the UI.

/// A run of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    /// A word that can be searched on its own.
    Token(String),
    Bold(Vec<Inline>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedKind {
    Synonyms,
    Antonyms,
    Similar,
    Other,
}

impl RelatedKind {
    fn from_category(category: &str) -> Self {
        match category.trim().to_ascii_lowercase().as_str() {
            "synonyms" => RelatedKind::Synonyms,
            "antonyms" => RelatedKind::Antonyms,
            "similar words" => RelatedKind::Similar,
            _ => RelatedKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBlock {
    Spacing,
    Header {
        word: String,
        pronunciation: Option<String>,
        part_of_speech: String,
    },
    DefinitionLabel,
    ExamplesLabel,
    RelatedWords {
        kind: RelatedKind,
        category: String,
        words: Vec<String>,
    },
    ListItem(Vec<Inline>),
    Paragraph(Vec<Inline>),
}

impl DisplayBlock {
    /// Searchable words of this block in display order.
    ///
    /// Related words are whole targets; their text is never split into tokens.
    pub fn search_targets(&self) -> Vec<&str> {
        match self {
            DisplayBlock::RelatedWords { words, .. } => words.iter().map(String::as_str).collect(),
            DisplayBlock::ListItem(inlines) | DisplayBlock::Paragraph(inlines) => {
                let mut targets = Vec::new();
                collect_tokens(inlines, &mut targets);
                targets
            }
            _ => Vec::new(),
        }
    }
}

fn collect_tokens<'a>(inlines: &'a [Inline], out: &mut Vec<&'a str>) {
    for inline in inlines {
        match inline {
            Inline::Token(word) => out.push(word),
            Inline::Bold(children) => collect_tokens(children, out),
            Inline::Text(_) => {}
        }
    }
}

/// Classification of one response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Header {
        word: &'a str,
        pronunciation: Option<&'a str>,
        part_of_speech: &'a str,
    },
    Definition { rest: Option<&'a str> },
    Examples,
    Related { category: &'a str, words: &'a str },
    ListItem(&'a str),
    Paragraph(&'a str),
}

/// Classifies a line. Earlier rules win: header (with, then without
/// pronunciation), definition label, examples label, related words, list
/// item, paragraph.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let line = line.trim();

    if line.is_empty() {
        LineKind::Blank
    } else if let Some(header) = parse_header(line) {
        header
    } else if let Some(rest) = line.strip_prefix("**Definition:**") {
        let rest = rest.trim();
        LineKind::Definition {
            rest: (!rest.is_empty()).then_some(rest),
        }
    } else if line == "**Examples:**" {
        LineKind::Examples
    } else if let Some((category, words)) = parse_related(line) {
        LineKind::Related { category, words }
    } else if let Some(text) = line.strip_prefix("- ") {
        LineKind::ListItem(text.trim_start())
    } else {
        LineKind::Paragraph(line)
    }
}

/// Splits `**label** remainder` into its parts.
fn split_bold_prefix(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("**")?;
    let end = rest.find("**")?;
    let label = &rest[..end];
    if label.trim().is_empty() {
        return None;
    }
    Some((label, rest[end + 2..].trim_start()))
}

fn parse_header(line: &str) -> Option<LineKind<'_>> {
    let (word, rest) = split_bold_prefix(line)?;

    let (pronunciation, rest) = match rest.strip_prefix('/') {
        Some(after_slash) => {
            let end = after_slash.find('/')?;
            let pronunciation = after_slash[..end].trim();
            if pronunciation.is_empty() {
                return None;
            }
            (Some(pronunciation), after_slash[end + 1..].trim_start())
        }
        None => (None, rest),
    };

    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    let part_of_speech = inner.trim().trim_matches('*').trim();
    if part_of_speech.is_empty() {
        return None;
    }

    Some(LineKind::Header {
        word: word.trim(),
        pronunciation,
        part_of_speech,
    })
}

fn parse_related(line: &str) -> Option<(&str, &str)> {
    let (label, words) = split_bold_prefix(line)?;
    let category = label.strip_suffix(':')?.trim();
    if category.is_empty() || words.is_empty() {
        return None;
    }
    Some((category, words))
}

/// Turns classified lines into display blocks.
pub fn build_blocks(lines: &[LineKind<'_>]) -> Vec<DisplayBlock> {
    let mut blocks = Vec::with_capacity(lines.len());

    for line in lines {
        match *line {
            LineKind::Blank => blocks.push(DisplayBlock::Spacing),
            LineKind::Header {
                word,
                pronunciation,
                part_of_speech,
            } => blocks.push(DisplayBlock::Header {
                word: word.to_string(),
                pronunciation: pronunciation.map(str::to_string),
                part_of_speech: part_of_speech.to_string(),
            }),
            LineKind::Definition { rest } => {
                blocks.push(DisplayBlock::DefinitionLabel);
                if let Some(rest) = rest {
                    blocks.push(DisplayBlock::Paragraph(parse_inline(rest)));
                }
            }
            LineKind::Examples => blocks.push(DisplayBlock::ExamplesLabel),
            LineKind::Related { category, words } => blocks.push(DisplayBlock::RelatedWords {
                kind: RelatedKind::from_category(category),
                category: category.to_string(),
                words: words
                    .split(',')
                    .map(str::trim)
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect(),
            }),
            LineKind::ListItem(text) => blocks.push(DisplayBlock::ListItem(parse_inline(text))),
            LineKind::Paragraph(text) => blocks.push(DisplayBlock::Paragraph(parse_inline(text))),
        }
    }

    blocks
}

/// Parses a complete response in one pass.
pub fn render(text: &str) -> Vec<DisplayBlock> {
    let lines: Vec<LineKind<'_>> = text.lines().map(classify_line).collect();
    build_blocks(&lines)
}

/// Parses `**bold**` spans, tokenizing both inside and outside them.
/// An unterminated `**` is kept as literal text.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };

        inlines.extend(make_clickable(&rest[..start]));
        let inner = &after[..end];
        if !inner.is_empty() {
            inlines.push(Inline::Bold(make_clickable(inner)));
        }
        rest = &after[end + 2..];
    }

    inlines.extend(make_clickable(rest));
    inlines
}

/// Splits text into literal runs and searchable tokens.
///
/// A token is a maximal run of ASCII letters; digits, punctuation and
/// whitespace stay literal.
pub fn make_clickable(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut current = String::new();
    let mut in_token = false;

    for ch in text.chars() {
        let is_letter = ch.is_ascii_alphabetic();
        if is_letter != in_token && !current.is_empty() {
            inlines.push(if in_token {
                Inline::Token(std::mem::take(&mut current))
            } else {
                Inline::Text(std::mem::take(&mut current))
            });
        }
        in_token = is_letter;
        current.push(ch);
    }

    if !current.is_empty() {
        inlines.push(if in_token {
            Inline::Token(current)
        } else {
            Inline::Text(current)
        });
    }

    inlines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(inlines: &[Inline]) -> Vec<&str> {
        let mut out = Vec::new();
        collect_tokens(inlines, &mut out);
        out
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn token(s: &str) -> Inline {
        Inline::Token(s.to_string())
    }

    #[test]
    fn renders_full_response_in_order() {
        let blocks = render("**cat** /kæt/ (noun)\n\nA small animal.\n\n**Synonyms:** kitty, feline");

        assert_eq!(blocks.len(), 5);
        assert_eq!(
            blocks[0],
            DisplayBlock::Header {
                word: "cat".to_string(),
                pronunciation: Some("kæt".to_string()),
                part_of_speech: "noun".to_string(),
            }
        );
        assert_eq!(blocks[1], DisplayBlock::Spacing);
        assert_eq!(blocks[2].search_targets(), vec!["A", "small", "animal"]);
        assert!(matches!(blocks[2], DisplayBlock::Paragraph(_)));
        assert_eq!(blocks[3], DisplayBlock::Spacing);
        assert_eq!(
            blocks[4],
            DisplayBlock::RelatedWords {
                kind: RelatedKind::Synonyms,
                category: "Synonyms".to_string(),
                words: vec!["kitty".to_string(), "feline".to_string()],
            }
        );
    }

    #[test]
    fn tokenizer_splits_on_non_letters() {
        let inlines = make_clickable("it's 2 cats!");
        assert_eq!(tokens(&inlines), vec!["it", "s", "cats"]);
        assert_eq!(
            inlines,
            vec![
                token("it"),
                text("'"),
                token("s"),
                text(" 2 "),
                token("cats"),
                text("!"),
            ]
        );
    }

    #[test]
    fn tokenizer_keeps_non_ascii_literal() {
        assert_eq!(tokens(&make_clickable("café au lait")), vec!["caf", "au", "lait"]);
        assert!(make_clickable("").is_empty());
    }

    #[test]
    fn header_without_pronunciation() {
        assert_eq!(
            classify_line("**run** (verb)"),
            LineKind::Header {
                word: "run",
                pronunciation: None,
                part_of_speech: "verb",
            }
        );
    }

    #[test]
    fn header_strips_emphasis_from_part_of_speech() {
        assert_eq!(
            classify_line("**happy** /ˈhæpi/ (*adjective*)"),
            LineKind::Header {
                word: "happy",
                pronunciation: Some("ˈhæpi"),
                part_of_speech: "adjective",
            }
        );
    }

    #[test]
    fn header_must_end_with_part_of_speech() {
        assert!(matches!(
            classify_line("**cat** (noun) is a pet"),
            LineKind::Paragraph(_)
        ));
        assert!(matches!(classify_line("**cat** //(noun)"), LineKind::Paragraph(_)));
    }

    #[test]
    fn definition_label_with_and_without_content() {
        assert_eq!(classify_line("**Definition:**"), LineKind::Definition { rest: None });
        let blocks = render("**Definition:** A pet.");
        assert_eq!(blocks[0], DisplayBlock::DefinitionLabel);
        assert_eq!(blocks[1].search_targets(), vec!["A", "pet"]);
    }

    #[test]
    fn examples_label_is_exact() {
        assert_eq!(classify_line("  **Examples:**  "), LineKind::Examples);
        // Falls through to the related-words rule.
        assert_eq!(
            classify_line("**Examples:** one, two"),
            LineKind::Related {
                category: "Examples",
                words: "one, two",
            }
        );
    }

    #[test]
    fn related_words_drop_empty_entries() {
        let blocks = render("**Antonyms:** sad, , unhappy ,");
        assert_eq!(
            blocks[0],
            DisplayBlock::RelatedWords {
                kind: RelatedKind::Antonyms,
                category: "Antonyms".to_string(),
                words: vec!["sad".to_string(), "unhappy".to_string()],
            }
        );
    }

    #[test]
    fn related_kinds() {
        assert_eq!(RelatedKind::from_category("Similar words"), RelatedKind::Similar);
        assert_eq!(RelatedKind::from_category("synonyms"), RelatedKind::Synonyms);
        assert_eq!(RelatedKind::from_category("Word family"), RelatedKind::Other);
    }

    #[test]
    fn related_words_are_whole_targets() {
        let blocks = render("**Similar words:** pussy cat, tomcat");
        assert_eq!(blocks[0].search_targets(), vec!["pussy cat", "tomcat"]);
    }

    #[test]
    fn bold_label_paragraph_is_read_as_related_words() {
        // First match wins, as for any `**Label:** text` line.
        assert!(matches!(
            classify_line("**Note:** this word is informal."),
            LineKind::Related { category: "Note", .. }
        ));
    }

    #[test]
    fn list_items_are_tokenized() {
        let blocks = render("- The cat sleeps.");
        assert!(matches!(blocks[0], DisplayBlock::ListItem(_)));
        assert_eq!(blocks[0].search_targets(), vec!["The", "cat", "sleeps"]);
        assert!(matches!(classify_line("-dash"), LineKind::Paragraph("-dash")));
    }

    #[test]
    fn bold_spans_nest_tokens() {
        let inlines = parse_inline("I have a **big dog**.");
        assert_eq!(
            inlines,
            vec![
                token("I"),
                text(" "),
                token("have"),
                text(" "),
                token("a"),
                text(" "),
                Inline::Bold(vec![token("big"), text(" "), token("dog")]),
                text("."),
            ]
        );
    }

    #[test]
    fn unterminated_bold_stays_literal() {
        let inlines = parse_inline("so **bold");
        assert_eq!(inlines, vec![token("so"), text(" **"), token("bold")]);
    }

    #[test]
    fn header_and_labels_have_no_targets() {
        let blocks = render("**cat** (noun)\n**Examples:**\n");
        assert!(blocks.iter().all(|b| b.search_targets().is_empty()));
    }
}
