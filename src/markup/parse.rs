//! Block parser.

use super::Block;

/// Split section content into blocks.
///
/// Headings and rules always stand alone even without surrounding blank
/// lines; a quote line ends a running paragraph and vice versa.
pub fn parse(content: &str) -> Vec<Block> {
    let mut parser = BlockParser::default();

    for raw in content.lines() {
        let line = raw.trim();

        if line.is_empty() {
            parser.flush();
        } else if let Some((level, text)) = heading(line) {
            parser.flush();
            parser.blocks.push(Block::Heading {
                level,
                text: text.to_string(),
            });
        } else if line == "---" || line == "***" {
            parser.flush();
            parser.blocks.push(Block::Rule);
        } else if let Some(quoted) = line.strip_prefix('>') {
            if !parser.paragraph.is_empty() {
                parser.flush();
            }
            let quoted = quoted.strip_prefix(' ').unwrap_or(quoted);
            parser.quote.push(quoted.trim_end());
        } else {
            if !parser.quote.is_empty() {
                parser.flush();
            }
            parser.paragraph.push(line);
        }
    }

    parser.flush();
    parser.blocks
}

#[derive(Default)]
struct BlockParser<'a> {
    blocks: Vec<Block>,
    paragraph: Vec<&'a str>,
    quote: Vec<&'a str>,
}

impl BlockParser<'_> {
    fn flush(&mut self) {
        if !self.paragraph.is_empty() {
            self.blocks.push(Block::Paragraph(self.paragraph.join("\n")));
            self.paragraph.clear();
        }
        if !self.quote.is_empty() {
            // A lone ">" keeps the quote open but contributes no text.
            let lines: Vec<&str> = self.quote.drain(..).filter(|l| !l.is_empty()).collect();
            if !lines.is_empty() {
                self.blocks.push(Block::Quote(lines.join("\n")));
            }
        }
    }
}

/// Match `#`..`######` followed by whitespace and some text.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some((hashes.min(3) as u8, text))
}
