use crate::error::{Result, UastError};

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub test: NameTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Type(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Has(String),
    Eq(String, String),
    Ne(String, String),
    /// 1-based position among the matches sharing a parent, as in `//Call[2]`
    Index(usize),
}

/// Parses a path expression. Relative paths search the whole tree.
pub fn parse(expr: &str) -> Result<Path> {
    let mut parser = Parser {
        src: expr,
        chars: expr.trim().chars().collect(),
        pos: 0,
    };
    parser.path()
}

struct Parser<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn path(&mut self) -> Result<Path> {
        let mut steps = Vec::new();

        let mut axis = if self.eat_str("//") {
            Axis::Descendant
        } else if self.eat('/') {
            Axis::Child
        } else {
            Axis::Descendant
        };

        loop {
            steps.push(self.step(axis)?);
            self.skip_ws();
            if self.at_end() {
                break;
            }
            axis = if self.eat_str("//") {
                Axis::Descendant
            } else if self.eat('/') {
                Axis::Child
            } else {
                return Err(self.unexpected());
            };
        }

        Ok(Path { steps })
    }

    fn step(&mut self, axis: Axis) -> Result<Step> {
        self.skip_ws();
        let test = if self.eat('*') {
            NameTest::Any
        } else {
            let name = self.name();
            if name.is_empty() {
                return Err(self.unexpected());
            }
            NameTest::Type(name)
        };

        let mut predicates = Vec::new();
        self.skip_ws();
        while self.eat('[') {
            predicates.push(self.predicate()?);
            self.skip_ws();
            if !self.eat(']') {
                return Err(self.unexpected());
            }
            self.skip_ws();
        }

        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_ws();
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let digits = self.take_while(|c| c.is_ascii_digit());
            return match digits.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Predicate::Index(n)),
                _ => Err(self.error(format!("invalid position {}", digits))),
            };
        }

        if !self.eat('@') {
            return Err(self.unexpected());
        }
        let attr = self.name();
        if attr.is_empty() {
            return Err(self.unexpected());
        }

        self.skip_ws();
        if self.eat_str("!=") {
            let value = self.literal()?;
            Ok(Predicate::Ne(attr, value))
        } else if self.eat('=') {
            let value = self.literal()?;
            Ok(Predicate::Eq(attr, value))
        } else {
            Ok(Predicate::Has(attr))
        }
    }

    fn literal(&mut self) -> Result<String> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        let value = self.take_while(|c| c != quote);
        if !self.eat(quote) {
            return Err(self.error("unterminated string literal".to_string()));
        }
        Ok(value)
    }

    fn name(&mut self) -> String {
        self.take_while(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let len = s.chars().count();
        let matches = self.chars.len() >= self.pos + len
            && self.chars[self.pos..self.pos + len].iter().copied().eq(s.chars());
        if matches {
            self.pos += len;
        }
        matches
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn unexpected(&self) -> UastError {
        match self.peek() {
            Some(c) => self.error(format!("unexpected '{}' at position {}", c, self.pos)),
            None => self.error("unexpected end of expression".to_string()),
        }
    }

    fn error(&self, message: String) -> UastError {
        UastError::Query(format!("{} in {:?}", message, self.src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> NameTest {
        NameTest::Type(name.to_string())
    }

    #[test]
    fn test_parse_descendant() {
        let path = parse("//uast:Identifier").unwrap();
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].axis, Axis::Descendant);
        assert_eq!(path.steps[0].test, ty("uast:Identifier"));
    }

    #[test]
    fn test_parse_relative_is_descendant() {
        let path = parse("Identifier").unwrap();
        assert_eq!(path.steps[0].axis, Axis::Descendant);
    }

    #[test]
    fn test_parse_multiple_steps() {
        let path = parse("/File//*[@role='Import'][2]").unwrap();
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.steps[0].axis, Axis::Child);
        assert_eq!(path.steps[0].test, ty("File"));
        assert_eq!(path.steps[1].axis, Axis::Descendant);
        assert_eq!(path.steps[1].test, NameTest::Any);
        assert_eq!(
            path.steps[1].predicates,
            vec![
                Predicate::Eq("role".to_string(), "Import".to_string()),
                Predicate::Index(2)
            ]
        );
    }

    #[test]
    fn test_parse_predicates() {
        let path = parse(r#"//call[@token != "x"][@Name]"#).unwrap();
        assert_eq!(
            path.steps[0].predicates,
            vec![
                Predicate::Ne("token".to_string(), "x".to_string()),
                Predicate::Has("Name".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("//").is_err());
        assert!(parse("//a[").is_err());
        assert!(parse("//a[@b='c]").is_err());
        assert!(parse("//a[0]").is_err());
        assert!(parse("//a b").is_err());
        assert!(parse("//a[b]").is_err());
    }
}
