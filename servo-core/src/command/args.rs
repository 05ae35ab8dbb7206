/*
    Payload Arguments
        Whitespace separated tokens of one payload line.
        Every token must be consumed, trailing tokens are an error.
*/

use super::*;

/* --------------------------- Code -------------------------- */
pub struct ArgReader<'a> {
    tokens: core::str::SplitAsciiWhitespace<'a>,
}

impl<'a> ArgReader<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { tokens: line.split_ascii_whitespace() }
    }

    fn token(&mut self) -> Result<&'a str, ErrorCode> {
        self.tokens.next().ok_or(ErrorCode::ReadValueError)
    }

    pub fn read_i32(&mut self) -> Result<i32, ErrorCode> {
        self.token()?.parse().map_err(|_| ErrorCode::ReadValueError)
    }

    pub fn read_f32(&mut self) -> Result<f32, ErrorCode> {
        let val: f32 = self.token()?.parse().map_err(|_| ErrorCode::ReadValueError)?;
        if val.is_finite() {
            Ok(val)
        } else {
            Err(ErrorCode::NonFiniteFloat)
        }
    }

    pub fn finish(mut self) -> Result<(), ErrorCode> {
        match self.tokens.next() {
            None => Ok(()),
            Some(_) => Err(ErrorCode::ReadValueError),
        }
    }
}

/// A payload line holding exactly one integer.
pub fn parse_i32_line(line: &str) -> Result<i32, ErrorCode> {
    let mut args = ArgReader::new(line);
    let val = args.read_i32()?;
    args.finish()?;
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_mixed_tokens_in_order() {
        let mut args = ArgReader::new("  150 0.5\t-3 ");
        assert_eq!(args.read_f32(), Ok(150.0));
        assert_eq!(args.read_f32(), Ok(0.5));
        assert_eq!(args.read_i32(), Ok(-3));
        assert_eq!(args.finish(), Ok(()));
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for text in ["nan", "inf", "-inf", "infinity", "NaN"] {
            assert_eq!(ArgReader::new(text).read_f32(), Err(ErrorCode::NonFiniteFloat), "{}", text);
        }
    }

    #[test]
    fn missing_malformed_and_trailing_tokens() {
        assert_eq!(ArgReader::new("").read_i32(), Err(ErrorCode::ReadValueError));
        assert_eq!(ArgReader::new("12x").read_i32(), Err(ErrorCode::ReadValueError));
        assert_eq!(ArgReader::new("1.5").read_i32(), Err(ErrorCode::ReadValueError));
        assert_eq!(parse_i32_line("4 5"), Err(ErrorCode::ReadValueError));
        assert_eq!(parse_i32_line(" -90 "), Ok(-90));
    }
}
