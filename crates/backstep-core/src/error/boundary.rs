/// Declare a `From` conversion between two error types at a module boundary.
///
/// Each invocation expands to a single `impl From<Inner> for Outer`, which is
/// what lets `?` convert a collaborator's error into this crate's error type
/// without a `map_err()` at every call site.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use backstep_core::error_boundary;
///
/// #[derive(Debug, thiserror::Error)]
/// enum LoadError {
///     #[error("bad number: {0}")]
///     Number(String),
/// }
///
/// error_boundary!(std::num::ParseIntError => LoadError, |e| {
///     LoadError::Number(e.to_string())
/// });
///
/// fn parse_retries(raw: &str) -> Result<u32, LoadError> {
///     Ok(raw.trim().parse::<u32>()?)
/// }
///
/// assert_eq!(parse_retries(" 5 ").unwrap(), 5);
/// assert!(parse_retries("five").is_err());
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::codec::CodecError;

    #[derive(Debug, thiserror::Error, PartialEq)]
    enum CampaignError {
        #[error("bad ceiling: {0}")]
        Ceiling(String),
        #[error("bad payload: {0}")]
        Payload(String),
    }

    error_boundary!(std::num::ParseIntError => CampaignError, |e| {
        CampaignError::Ceiling(e.to_string())
    });

    error_boundary!(CodecError => CampaignError, |e| {
        CampaignError::Payload(e.to_string())
    });

    fn parse_ceiling(raw: &str) -> Result<u32, CampaignError> {
        let ceiling = raw.parse::<u32>()?;
        Ok(ceiling)
    }

    fn decode_payload(raw: &str) -> Result<Vec<u32>, CampaignError> {
        let values = crate::codec::decode_json_string::<Vec<u32>>(raw)?;
        Ok(values)
    }

    #[test]
    fn test_parse_error_crosses_boundary() {
        match parse_ceiling("three").unwrap_err() {
            CampaignError::Ceiling(msg) => assert!(msg.contains("invalid digit")),
            other => panic!("Expected Ceiling variant, got {other:?}"),
        }
        assert_eq!(parse_ceiling("3"), Ok(3));
    }

    #[test]
    fn test_codec_error_crosses_boundary() {
        match decode_payload("[1, 2,").unwrap_err() {
            CampaignError::Payload(msg) => assert!(msg.starts_with("JSON codec error")),
            other => panic!("Expected Payload variant, got {other:?}"),
        }
        assert_eq!(decode_payload("[1,2]"), Ok(vec![1, 2]));
    }
}
