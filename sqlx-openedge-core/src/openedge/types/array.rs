use crate::openedge::OpenEdgeValueData;
use std::iter::Peekable;
use std::str::Chars;

/// Split a native array literal (`{1,"a b",NULL,{2,3}}`) and run every
/// member through `element`.
///
/// Quoted members may contain backslash escapes, an unquoted `NULL` is a
/// null member, and nested braces produce nested arrays. A leading
/// dimension decoration (`[1:3]={...}`) is skipped. A malformed literal is
/// returned as text.
pub fn parse_array<F>(raw: &str, element: F) -> OpenEdgeValueData
where
    F: Fn(&str) -> OpenEdgeValueData,
{
    let body = if raw.starts_with('[') {
        raw.find("={").map(|i| &raw[i + 1..]).unwrap_or(raw)
    } else {
        raw
    };

    let mut literal = ArrayLiteral {
        chars: body.trim().chars().peekable(),
        element: &element,
    };

    match literal.parse() {
        Some(items) => OpenEdgeValueData::Array(items),
        None => OpenEdgeValueData::Text(raw.to_owned()),
    }
}

struct ArrayLiteral<'a, F> {
    chars: Peekable<Chars<'a>>,
    element: &'a F,
}

impl<F> ArrayLiteral<'_, F>
where
    F: Fn(&str) -> OpenEdgeValueData,
{
    fn parse(&mut self) -> Option<Vec<OpenEdgeValueData>> {
        if self.chars.next()? != '{' {
            return None;
        }
        let items = self.level()?;
        self.chars.next().is_none().then_some(items)
    }

    // Called with the opening brace already consumed.
    fn level(&mut self) -> Option<Vec<OpenEdgeValueData>> {
        let mut items = Vec::new();

        if self.chars.peek() == Some(&'}') {
            self.chars.next();
            return Some(items);
        }

        loop {
            let item = match self.chars.peek()? {
                '{' => {
                    self.chars.next();
                    OpenEdgeValueData::Array(self.level()?)
                }
                '"' => {
                    self.chars.next();
                    let member = self.quoted()?;
                    (self.element)(&member)
                }
                _ => {
                    let member = self.unquoted();
                    if member.eq_ignore_ascii_case("NULL") {
                        OpenEdgeValueData::Null
                    } else {
                        (self.element)(&member)
                    }
                }
            };
            items.push(item);

            match self.chars.next()? {
                ',' => continue,
                '}' => return Some(items),
                _ => return None,
            }
        }
    }

    fn quoted(&mut self) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.chars.next()? {
                '\\' => out.push(self.chars.next()?),
                '"' => return Some(out),
                c => out.push(c),
            }
        }
    }

    fn unquoted(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == ',' || c == '}' {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out.trim().to_owned()
    }
}
