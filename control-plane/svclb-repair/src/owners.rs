use svclb_store::ServiceKey;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Owner identity {0:?} is not of the form namespace/name")]
    Malformed(String),

    #[error("Owner identity {0:?} has an empty namespace")]
    MissingNamespace(String),
}

/// Decode the owner identity stored on a derived load balancer into the
/// key of the service that owns it. Pure; the caller decides what an
/// unreadable owner means.
pub fn decode_owner(owner: &str) -> Result<ServiceKey, DecodeError> {
    let (namespace, name) = owner
        .split_once('/')
        .ok_or_else(|| DecodeError::Malformed(owner.to_string()))?;
    if name.is_empty() || name.contains('/') {
        return Err(DecodeError::Malformed(owner.to_string()));
    }
    if namespace.is_empty() {
        return Err(DecodeError::MissingNamespace(owner.to_string()));
    }
    Ok(ServiceKey::new(namespace, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_namespace_and_name() {
        assert_eq!(
            decode_owner("ns/web"),
            Ok(ServiceKey::new("ns", "web"))
        );
    }

    #[test]
    fn rejects_missing_separator() {
        assert_eq!(
            decode_owner("web"),
            Err(DecodeError::Malformed("web".into()))
        );
    }

    #[test]
    fn rejects_empty_namespace() {
        assert_eq!(
            decode_owner("/web"),
            Err(DecodeError::MissingNamespace("/web".into()))
        );
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            decode_owner("ns/"),
            Err(DecodeError::Malformed("ns/".into()))
        );
    }

    #[test]
    fn rejects_extra_separators() {
        assert_eq!(
            decode_owner("a/b/c"),
            Err(DecodeError::Malformed("a/b/c".into()))
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(decode_owner("").is_err());
    }
}
