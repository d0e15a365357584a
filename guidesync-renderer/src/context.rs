//! Article context: serializable rendering payload built from source text.
//!
//! The builder recognises only the structure every lightweight markup shares:
//! `=`-prefixed headings, blank-line separated paragraphs, `*`/`-` bullet
//! lists and `----` delimited listing blocks. Comment lines (`//`), comment
//! blocks (`////`) and attribute entries (`:name: value`) are dropped, which
//! also removes the document's metadata headers.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// One structural block of an article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    List { items: Vec<String> },
    Listing { text: String },
}

/// Rendering payload for the article template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleContext {
    /// Level-one heading, rendered by the remote as the article title and
    /// therefore kept out of `blocks`.
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Default)]
struct Builder {
    ctx: ArticleContext,
    paragraph: Vec<String>,
    list: Vec<String>,
    listing: Option<Vec<String>>,
    in_comment_block: bool,
}

impl Builder {
    fn flush(&mut self) {
        if !self.paragraph.is_empty() {
            let text = self.paragraph.join(" ");
            self.ctx.blocks.push(Block::Paragraph { text });
            self.paragraph.clear();
        }
        if !self.list.is_empty() {
            let items = std::mem::take(&mut self.list);
            self.ctx.blocks.push(Block::List { items });
        }
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();

        if self.in_comment_block {
            if trimmed == "////" {
                self.in_comment_block = false;
            }
            return;
        }
        if let Some(listing) = self.listing.as_mut() {
            if trimmed == "----" {
                let text = listing.join("\n");
                self.listing = None;
                self.ctx.blocks.push(Block::Listing { text });
            } else {
                listing.push(line.to_owned());
            }
            return;
        }

        match trimmed {
            "////" => {
                self.flush();
                self.in_comment_block = true;
            }
            "----" => {
                self.flush();
                self.listing = Some(Vec::new());
            }
            "" => self.flush(),
            t if t.starts_with("//") || is_attribute_entry(t) => {}
            t if heading_level(t).is_some() => {
                self.flush();
                let level = heading_level(t).unwrap_or(1);
                let text = t.trim_start_matches('=').trim().to_owned();
                if level == 1 && self.ctx.title.is_none() {
                    self.ctx.title = Some(text);
                } else {
                    self.ctx.blocks.push(Block::Heading {
                        level: level.min(6),
                        text,
                    });
                }
            }
            t if t.starts_with("* ") || t.starts_with("- ") => {
                if !self.paragraph.is_empty() {
                    let text = self.paragraph.join(" ");
                    self.ctx.blocks.push(Block::Paragraph { text });
                    self.paragraph.clear();
                }
                self.list.push(t[2..].trim().to_owned());
            }
            t => {
                if !self.list.is_empty() {
                    self.flush();
                }
                self.paragraph.push(t.to_owned());
            }
        }
    }

    fn finish(mut self) -> ArticleContext {
        if let Some(listing) = self.listing.take() {
            // Unterminated listing: keep what was collected.
            self.ctx.blocks.push(Block::Listing {
                text: listing.join("\n"),
            });
        }
        self.flush();
        self.ctx
    }
}

fn heading_level(line: &str) -> Option<u8> {
    let level = line.chars().take_while(|c| *c == '=').count();
    let rest = &line[level..];
    (level > 0 && rest.starts_with(' ')).then(|| u8::try_from(level).unwrap_or(u8::MAX))
}

fn is_attribute_entry(line: &str) -> bool {
    line.strip_prefix(':')
        .and_then(|rest| rest.split_once(':'))
        .is_some_and(|(name, _)| !name.is_empty() && !name.contains(char::is_whitespace))
}

impl ArticleContext {
    /// Build the context from raw source text.
    pub fn from_source(source: &str) -> Self {
        let mut builder = Builder::default();
        for line in source.lines() {
            builder.line(line);
        }
        builder.finish()
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}
