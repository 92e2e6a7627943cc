//! Reference scanner
//!
//! Splits a reference string into its syntactic parts without consulting
//! the schema:
//!
//! ```text
//! [#] segment(.segment)* [# member] [(descriptor)] [[index]]
//! ```
//!
//! Without a `#`, the last dotted segment is the member.

use requisite_core::{is_identifier_part, is_identifier_start};
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

// ============================================================================
// SYNTAX TYPES
// ============================================================================

/// The syntactic parts of a reference string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    /// Type path segments before the member. Empty means the base type.
    pub path: Vec<String>,
    pub member: String,
    /// Parameter descriptors; `Some(vec![])` for an explicit `()`.
    pub descriptor: Option<Vec<String>>,
    pub index: Option<i32>,
}

impl RawReference {
    pub fn joined_path(&self) -> String {
        self.path.join(".")
    }
}

/// A syntax or resolution defect in a reference string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceDefect {
    #[error("invalid character '{character}' at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },

    #[error("empty identifier at offset {offset}")]
    EmptyIdentifier { offset: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("invalid index '{text}'")]
    InvalidIndex { text: String },

    #[error("an index is only valid on field references")]
    IndexOnMethod,

    #[error("{method} is a method, expected a field")]
    ExpectedField { method: String },

    #[error("no type named '{path}'")]
    UnknownType { path: String },

    #[error("{owner} has no member '{member}' (fields: [{}], methods: [{}])", .fields.join(", "), .methods.join(", "))]
    NoSuchMember {
        owner: String,
        member: String,
        fields: Vec<String>,
        methods: Vec<String>,
    },

    #[error("'{member}' on {owner} is ambiguous between {}", .candidates.join(" and "))]
    AmbiguousMember {
        owner: String,
        member: String,
        candidates: Vec<String>,
    },
}

impl ReferenceDefect {
    /// Grammatically valid, but names nothing in the schema.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            ReferenceDefect::UnknownType { .. } | ReferenceDefect::NoSuchMember { .. }
        )
    }
}

// ============================================================================
// SCANNER IMPLEMENTATION
// ============================================================================

/// Scanner over a single reference string.
pub struct ReferenceScanner<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: usize,
    origin: usize,
}

impl<'a> ReferenceScanner<'a> {
    /// Scan `source` exactly as given.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            pos: 0,
            origin: 0,
        }
    }

    /// Scan `source` with surrounding whitespace removed. Offsets still
    /// refer to the untrimmed text.
    pub fn trimmed(source: &'a str) -> Self {
        let origin = source.len() - source.trim_start().len();
        let body = source.trim();
        Self {
            source: body,
            chars: body.char_indices().peekable(),
            pos: 0,
            origin,
        }
    }

    pub fn scan(mut self) -> Result<RawReference, ReferenceDefect> {
        if self.peek_char().is_none() {
            return Err(ReferenceDefect::EmptyIdentifier {
                offset: self.origin,
            });
        }

        let mut segments = Vec::new();
        let mut member = None;

        if self.peek_char() == Some('#') {
            self.advance();
            member = Some(self.scan_identifier()?);
        } else {
            segments.push(self.scan_identifier()?);
            loop {
                match self.peek_char() {
                    Some('.') => {
                        self.advance();
                        segments.push(self.scan_identifier()?);
                    }
                    Some('#') => {
                        self.advance();
                        member = Some(self.scan_identifier()?);
                        break;
                    }
                    _ => break,
                }
            }
        }

        let (path, member) = match member {
            Some(member) => (segments, member),
            None => match segments.pop() {
                Some(last) => (segments, last),
                None => {
                    return Err(ReferenceDefect::EmptyIdentifier {
                        offset: self.offset(),
                    })
                }
            },
        };

        let descriptor = if self.peek_char() == Some('(') {
            Some(self.scan_descriptor()?)
        } else {
            None
        };

        let index = if self.peek_char() == Some('[') {
            Some(self.scan_index()?)
        } else {
            None
        };

        if let Some(c) = self.peek_char() {
            return Err(self.invalid(c));
        }

        Ok(RawReference {
            path,
            member,
            descriptor,
            index,
        })
    }

    /// Scan one identifier.
    fn scan_identifier(&mut self) -> Result<String, ReferenceDefect> {
        let start = self.pos;

        match self.peek_char() {
            None => {
                return Err(ReferenceDefect::UnexpectedEnd {
                    expected: "identifier",
                })
            }
            Some(c) if is_identifier_start(c) => {
                self.advance();
            }
            Some('.') | Some('#') | Some('(') | Some('[') => {
                return Err(ReferenceDefect::EmptyIdentifier {
                    offset: self.offset(),
                })
            }
            Some(c) => return Err(self.invalid(c)),
        }

        while let Some(c) = self.peek_char() {
            if is_identifier_part(c) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(self.source[start..self.pos].to_string())
    }

    /// Scan `( p1, p2 )`; whitespace inside a parameter is dropped.
    fn scan_descriptor(&mut self) -> Result<Vec<String>, ReferenceDefect> {
        self.advance(); // (
        let start = self.pos;

        loop {
            match self.peek_char() {
                None => return Err(ReferenceDefect::UnexpectedEnd { expected: "')'" }),
                Some(')') => break,
                Some(c) if matches!(c, '(' | '[' | ']' | '#') => return Err(self.invalid(c)),
                Some(_) => {
                    self.advance();
                }
            }
        }

        let body = &self.source[start..self.pos];
        self.advance(); // )

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        let mut part_start = start;
        for part in body.split(',') {
            let param: String = part.chars().filter(|c| !c.is_whitespace()).collect();
            if param.is_empty() {
                return Err(ReferenceDefect::EmptyIdentifier {
                    offset: self.origin + part_start,
                });
            }
            params.push(param);
            part_start += part.len() + 1;
        }
        Ok(params)
    }

    /// Scan `[digits]`.
    fn scan_index(&mut self) -> Result<i32, ReferenceDefect> {
        self.advance(); // [
        let start = self.pos;

        loop {
            match self.peek_char() {
                None => return Err(ReferenceDefect::UnexpectedEnd { expected: "']'" }),
                Some(']') => break,
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                }
                Some(c) => return Err(self.invalid(c)),
            }
        }

        let text = &self.source[start..self.pos];
        self.advance(); // ]

        text.parse::<i32>().map_err(|_| ReferenceDefect::InvalidIndex {
            text: text.to_string(),
        })
    }

    fn invalid(&self, character: char) -> ReferenceDefect {
        ReferenceDefect::InvalidCharacter {
            character,
            offset: self.offset(),
        }
    }

    fn offset(&self) -> usize {
        self.origin + self.pos
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }
}

/// Scan `source` into its syntactic parts.
pub fn scan(source: &str, trim: bool) -> Result<RawReference, ReferenceDefect> {
    if trim {
        ReferenceScanner::trimmed(source).scan()
    } else {
        ReferenceScanner::new(source).scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> RawReference {
        scan(s, true).unwrap()
    }

    #[test]
    fn test_bare_member() {
        let r = raw("coolToggle");
        assert!(r.path.is_empty());
        assert_eq!(r.member, "coolToggle");
        assert_eq!(r.descriptor, None);
        assert_eq!(r.index, None);
    }

    #[test]
    fn test_leading_hash() {
        let r = raw("#coolToggle");
        assert!(r.path.is_empty());
        assert_eq!(r.member, "coolToggle");
    }

    #[test]
    fn test_hash_separates_member() {
        let r = raw("ExampleConfig.ModuleC.Handlers#coolToggleIsEnabled");
        assert_eq!(r.path, vec!["ExampleConfig", "ModuleC", "Handlers"]);
        assert_eq!(r.member, "coolToggleIsEnabled");
    }

    #[test]
    fn test_dot_separates_member() {
        let r = raw("ExampleConfig.ModuleC.Handlers.coolToggleMatchesLameToggle");
        assert_eq!(r.joined_path(), "ExampleConfig.ModuleC.Handlers");
        assert_eq!(r.member, "coolToggleMatchesLameToggle");
    }

    #[test]
    fn test_index_and_descriptor() {
        let r = raw("Sub#list[2]");
        assert_eq!(r.index, Some(2));
        let r = raw("Handlers#is( T , T )");
        assert_eq!(r.descriptor, Some(vec!["T".to_string(), "T".to_string()]));
        let r = raw("Handlers#check()");
        assert_eq!(r.descriptor, Some(vec![]));
    }

    #[test]
    fn test_trim_keeps_untrimmed_offsets() {
        let err = scan("  cool!Toggle", true).unwrap_err();
        assert_eq!(
            err,
            ReferenceDefect::InvalidCharacter {
                character: '!',
                offset: 6
            }
        );
    }

    #[test]
    fn test_untrimmed_whitespace_is_invalid() {
        let err = scan(" coolToggle", false).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDefect::InvalidCharacter {
                character: ' ',
                offset: 0
            }
        ));
    }

    #[test]
    fn test_invalid_start_character() {
        let err = scan("9lives", true).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("'9'"));
        assert!(msg.contains("offset 0"));
    }

    #[test]
    fn test_empty_segment() {
        assert!(matches!(
            scan("a..b", true),
            Err(ReferenceDefect::EmptyIdentifier { offset: 2 })
        ));
        assert!(matches!(
            scan("", true),
            Err(ReferenceDefect::EmptyIdentifier { offset: 0 })
        ));
        assert!(matches!(
            scan("Type#", true),
            Err(ReferenceDefect::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_index_rejects_sign_and_garbage() {
        assert!(matches!(
            scan("list[-1]", true),
            Err(ReferenceDefect::InvalidCharacter { character: '-', .. })
        ));
        assert!(matches!(
            scan("list[]", true),
            Err(ReferenceDefect::InvalidIndex { .. })
        ));
        assert!(matches!(
            scan("list[1", true),
            Err(ReferenceDefect::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            scan("list[99999999999]", true),
            Err(ReferenceDefect::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(matches!(
            scan("list[1]x", true),
            Err(ReferenceDefect::InvalidCharacter {
                character: 'x',
                offset: 7
            })
        ));
    }

    #[test]
    fn test_dollar_and_underscore_identifiers() {
        let r = raw("$Outer._inner");
        assert_eq!(r.path, vec!["$Outer"]);
        assert_eq!(r.member, "_inner");
    }
}
