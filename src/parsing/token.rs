// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Generic placeholder token parser
//!
//! Scans input left-to-right for `open ... close` delimited tokens and hands
//! the expression between the delimiters to a handler; literal spans and
//! handler replacements are concatenated into the output. A backslash
//! immediately before a delimiter escapes it: the backslash is removed and
//! the delimiter kept literally. An unmatched open token emits the remainder
//! unchanged. O(n) over the input.
//!
//! The same parser drives `${...}` substitution, `#{...}` placeholder
//! rewriting and property-placeholder resolution; only the handler differs.
//! Each scanning pass honors escapes for its own delimiter pair only, so
//! `\${x}` is literal for a `${`/`}` pass and untouched by a `#{`/`}` pass.

use crate::core::Result;

/// Finds delimited tokens and replaces them through a handler
pub struct GenericTokenParser<'a> {
    open_token: &'a str,
    close_token: &'a str,
}

impl<'a> GenericTokenParser<'a> {
    /// Create a parser for one delimiter pair
    pub fn new(open_token: &'a str, close_token: &'a str) -> Self {
        Self {
            open_token,
            close_token,
        }
    }

    /// Parse `text`, replacing each token with the handler's return value
    ///
    /// The handler receives the raw expression between the delimiters.
    pub fn parse(
        &self,
        text: &str,
        handler: &mut dyn FnMut(&str) -> Result<String>,
    ) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let Some(mut start) = text.find(self.open_token) else {
            return Ok(text.to_string());
        };

        let src = text.as_bytes();
        let mut offset = 0usize;
        let mut builder = String::with_capacity(text.len());
        let mut expression = String::new();

        loop {
            if start > 0 && src[start - 1] == b'\\' {
                // escaped open token: drop the backslash, keep the token
                builder.push_str(&text[offset..start - 1]);
                builder.push_str(self.open_token);
                offset = start + self.open_token.len();
            } else {
                expression.clear();
                builder.push_str(&text[offset..start]);
                offset = start + self.open_token.len();
                let mut end = text[offset..].find(self.close_token).map(|i| i + offset);
                while let Some(e) = end {
                    if e > offset && src[e - 1] == b'\\' {
                        // escaped close token inside the expression
                        expression.push_str(&text[offset..e - 1]);
                        expression.push_str(self.close_token);
                        offset = e + self.close_token.len();
                        end = text[offset..].find(self.close_token).map(|i| i + offset);
                    } else {
                        expression.push_str(&text[offset..e]);
                        break;
                    }
                }
                match end {
                    None => {
                        // close token was not found
                        builder.push_str(&text[start..]);
                        offset = text.len();
                    }
                    Some(e) => {
                        builder.push_str(&handler(&expression)?);
                        offset = e + self.close_token.len();
                    }
                }
            }
            match text[offset..].find(self.open_token) {
                Some(i) => start = i + offset,
                None => break,
            }
        }
        if offset < text.len() {
            builder.push_str(&text[offset..]);
        }
        Ok(builder)
    }
}
