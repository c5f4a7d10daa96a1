use crate::host::{HostError, HostResult};

/// Translates a `/users/:id` style pattern into axum's `/users/{id}` syntax.
pub(crate) fn to_axum_path(pattern: &str) -> HostResult<String> {
    let trimmed = pattern.trim_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_owned());
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let mut path = String::with_capacity(pattern.len() + 2);
    for (index, segment) in segments.iter().enumerate() {
        path.push('/');
        if segment.is_empty() {
            return Err(HostError::invalid_pattern(pattern, "empty path segment"));
        }
        if segment.contains(['{', '}']) {
            return Err(HostError::invalid_pattern(pattern, "braces are reserved"));
        }
        if *segment == "*" {
            if index + 1 != segments.len() {
                return Err(HostError::invalid_pattern(
                    pattern,
                    "wildcard must be the last segment",
                ));
            }
            path.push_str("{*wildcard}");
        } else if let Some(param) = segment.strip_prefix(':') {
            if param.ends_with('?') {
                return Err(HostError::invalid_pattern(
                    pattern,
                    "optional parameters are not supported",
                ));
            }
            if param.is_empty() || !param.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(HostError::invalid_pattern(
                    pattern,
                    format!("invalid parameter name `{param}`"),
                ));
            }
            path.push('{');
            path.push_str(param);
            path.push('}');
        } else {
            path.push_str(segment);
        }
    }
    Ok(path)
}

/// Path with parameter names erased: two paths with the same shape but
/// different names cannot live in the same axum router.
pub(crate) fn shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translates_params_and_wildcards() {
        assert_eq!(to_axum_path("/").unwrap(), "/");
        assert_eq!(to_axum_path("users").unwrap(), "/users");
        assert_eq!(to_axum_path("/users/:id/").unwrap(), "/users/{id}");
        assert_eq!(
            to_axum_path("/posts/:post_id/comments/:id").unwrap(),
            "/posts/{post_id}/comments/{id}"
        );
        assert_eq!(to_axum_path("/files/*").unwrap(), "/files/{*wildcard}");
    }

    #[test]
    fn test_rejects_unsupported_patterns() {
        assert!(to_axum_path("/users/:id?").is_err());
        assert!(to_axum_path("/files/*/raw").is_err());
        assert!(to_axum_path("/users//x").is_err());
        assert!(to_axum_path("/users/{id}").is_err());
        assert!(to_axum_path("/users/:").is_err());
    }

    #[test]
    fn test_shape_ignores_param_names() {
        assert_eq!(shape("/posts/{id}"), shape("/posts/{slug}"));
        assert_ne!(shape("/posts/{id}"), shape("/posts/create"));
    }
}
