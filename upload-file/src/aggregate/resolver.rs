//! Aggregate type inference

use super::registry::{normalize_extension, normalize_mime, TypeRegistry, TYPE_OTHER};
use crate::error::{UploadError, UploadResult};

/// Rules applied when inferring an aggregate type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypePolicy {
    /// MIME type and extension must agree on the same type
    pub strict_type_checking: bool,

    /// Files matching nothing resolve to [`TYPE_OTHER`] instead of failing
    pub allow_unrecognized_types: bool,

    /// Types the result is restricted to (empty = no restriction)
    pub allowed_aggregate_types: Vec<String>,
}

impl TypePolicy {
    fn allows(&self, aggregate_type: &str) -> bool {
        self.allowed_aggregate_types.is_empty()
            || self.allowed_aggregate_types.iter().any(|t| t == aggregate_type)
    }
}

/// Maps a (MIME type, extension) pair to exactly one aggregate type
///
/// Resolution order:
///
/// 1. A type recognizing both the MIME type and the extension wins; among
///    several, the first allowed one in registry order.
/// 2. If nothing recognizes either side the file is unrecognized: an error,
///    or [`TYPE_OTHER`] when unrecognized types are allowed.
/// 3. Otherwise the sides disagree (or only one matched): an error in strict
///    mode, else the first allowed MIME match, falling back to the first
///    allowed extension match.
///
/// The result is then checked against the allowed aggregate types.
///
/// # Examples
///
/// ```rust
/// use upload_file::aggregate::{TypePolicy, TypeRegistry, TypeResolver};
///
/// let registry = TypeRegistry::with_defaults();
/// let policy = TypePolicy::default();
/// let resolver = TypeResolver::new(&registry, &policy);
///
/// assert_eq!(resolver.resolve("image/png", "png").unwrap(), "image");
/// // Lenient mode: the MIME type wins
/// assert_eq!(resolver.resolve("image/png", "pdf").unwrap(), "image");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    registry: &'a TypeRegistry,
    policy: &'a TypePolicy,
}

impl<'a> TypeResolver<'a> {
    /// Creates a resolver over a registry and policy
    #[must_use]
    pub const fn new(registry: &'a TypeRegistry, policy: &'a TypePolicy) -> Self {
        Self { registry, policy }
    }

    /// Infers the aggregate type of a file
    ///
    /// Inputs are case-insensitive and the extension may carry a leading dot.
    ///
    /// # Errors
    ///
    /// - [`UploadError::UnrecognizedType`] when nothing matches and unrecognized
    ///   types are not allowed
    /// - [`UploadError::StrictTypeMismatch`] when the sides disagree in strict mode
    /// - [`UploadError::AggregateTypeRestricted`] when the inferred type is not allowed
    pub fn resolve(&self, mime_type: &str, extension: &str) -> UploadResult<String> {
        let mime_type = normalize_mime(mime_type);
        let extension = normalize_extension(extension);

        let for_mime = self.registry.types_for_mime_type(&mime_type);
        let for_extension = self.registry.types_for_extension(&extension);

        let shared: Vec<&str> = for_mime
            .iter()
            .copied()
            .filter(|t| for_extension.contains(t))
            .collect();

        let unrecognized = || UploadError::UnrecognizedType {
            mime_type: mime_type.clone(),
            extension: extension.clone(),
        };

        let resolved = if let Some(first) = shared.first() {
            // An agreed type outside the allow-list is reported as restricted below
            shared
                .iter()
                .copied()
                .find(|t| self.policy.allows(t))
                .unwrap_or(*first)
        } else if for_mime.is_empty() && for_extension.is_empty() {
            if !self.policy.allow_unrecognized_types {
                return Err(unrecognized());
            }
            TYPE_OTHER
        } else if self.policy.strict_type_checking {
            return Err(UploadError::StrictTypeMismatch {
                mime_type,
                extension,
            });
        } else {
            let mut candidates = for_mime.iter().chain(for_extension.iter()).copied();
            let first = candidates.clone().next().ok_or_else(unrecognized)?;
            candidates.find(|t| self.policy.allows(t)).unwrap_or(first)
        };

        if !self.policy.allows(resolved) {
            return Err(UploadError::AggregateTypeRestricted {
                aggregate_type: resolved.to_string(),
                allowed: self.policy.allowed_aggregate_types.clone(),
            });
        }

        tracing::debug!(
            mime_type = %mime_type,
            extension = %extension,
            aggregate_type = %resolved,
            "aggregate type inferred"
        );
        Ok(resolved.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateTypeDefinition;
    use proptest::prelude::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::new([
            AggregateTypeDefinition::new("foo", ["foo/bar"], ["foo"]),
            AggregateTypeDefinition::new("bar", ["baz/qux"], ["bar"]),
            AggregateTypeDefinition::new("shared", ["foo/bar"], ["foo", "shr"]),
        ])
    }

    fn resolve(policy: &TypePolicy, mime: &str, ext: &str) -> UploadResult<String> {
        let registry = registry();
        TypeResolver::new(&registry, policy).resolve(mime, ext)
    }

    #[test]
    fn test_matching_pair() {
        let policy = TypePolicy::default();
        assert_eq!(resolve(&policy, "foo/bar", "foo").unwrap(), "foo");
        assert_eq!(resolve(&policy, "BAZ/QUX", ".BAR").unwrap(), "bar");
    }

    #[test]
    fn test_overlap_prefers_registry_order() {
        let policy = TypePolicy::default();
        assert_eq!(resolve(&policy, "foo/bar", "foo").unwrap(), "foo");

        let restricted = TypePolicy {
            allowed_aggregate_types: vec!["shared".to_string()],
            ..TypePolicy::default()
        };
        assert_eq!(resolve(&restricted, "foo/bar", "foo").unwrap(), "shared");
    }

    #[test]
    fn test_unrecognized() {
        let policy = TypePolicy::default();
        let err = resolve(&policy, "no/match", "nope").unwrap_err();
        assert!(matches!(err, UploadError::UnrecognizedType { .. }));

        let allow = TypePolicy {
            allow_unrecognized_types: true,
            ..TypePolicy::default()
        };
        assert_eq!(resolve(&allow, "no/match", "nope").unwrap(), TYPE_OTHER);
    }

    #[test]
    fn test_other_respects_allow_list() {
        let policy = TypePolicy {
            allow_unrecognized_types: true,
            allowed_aggregate_types: vec!["foo".to_string()],
            ..TypePolicy::default()
        };
        let err = resolve(&policy, "no/match", "nope").unwrap_err();
        assert!(matches!(err, UploadError::AggregateTypeRestricted { .. }));
    }

    #[test]
    fn test_mismatch_strict_and_lenient() {
        let strict = TypePolicy {
            strict_type_checking: true,
            ..TypePolicy::default()
        };
        let err = resolve(&strict, "foo/bar", "bar").unwrap_err();
        assert!(matches!(err, UploadError::StrictTypeMismatch { .. }));

        let lenient = TypePolicy::default();
        assert_eq!(resolve(&lenient, "foo/bar", "bar").unwrap(), "foo");
    }

    #[test]
    fn test_lenient_prefers_allowed_candidate() {
        let policy = TypePolicy {
            allowed_aggregate_types: vec!["bar".to_string()],
            ..TypePolicy::default()
        };
        assert_eq!(resolve(&policy, "foo/bar", "bar").unwrap(), "bar");
    }

    #[test]
    fn test_single_side_match() {
        let lenient = TypePolicy::default();
        assert_eq!(resolve(&lenient, "unknown/type", "bar").unwrap(), "bar");
        assert_eq!(resolve(&lenient, "baz/qux", "unknown").unwrap(), "bar");

        let strict = TypePolicy {
            strict_type_checking: true,
            ..TypePolicy::default()
        };
        let err = resolve(&strict, "unknown/type", "bar").unwrap_err();
        assert!(matches!(err, UploadError::StrictTypeMismatch { .. }));
    }

    #[test]
    fn test_restricted_type() {
        let policy = TypePolicy {
            allowed_aggregate_types: vec!["bar".to_string()],
            ..TypePolicy::default()
        };
        match resolve(&policy, "foo/bar", "foo").unwrap_err() {
            UploadError::AggregateTypeRestricted {
                aggregate_type,
                allowed,
            } => {
                assert_eq!(aggregate_type, "foo");
                assert_eq!(allowed, vec!["bar"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_registry_svg_is_vector() {
        let registry = TypeRegistry::with_defaults();
        let policy = TypePolicy {
            strict_type_checking: true,
            ..TypePolicy::default()
        };
        let resolver = TypeResolver::new(&registry, &policy);
        assert_eq!(resolver.resolve("image/svg+xml", "svg").unwrap(), "image_vector");
        assert_eq!(resolver.resolve("application/pdf", "pdf").unwrap(), "pdf");
        assert_eq!(resolver.resolve("text/csv", "csv").unwrap(), "spreadsheet");
    }

    proptest! {
        #[test]
        fn disjoint_types_resolve_to_their_owner(
            names in proptest::collection::btree_set("[a-z]{3,8}", 1..6),
            pick in any::<prop::sample::Index>(),
            strict in any::<bool>(),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let registry = TypeRegistry::new(names.iter().map(|n| {
                AggregateTypeDefinition::new(n.clone(), [format!("x-{n}/type")], [format!("{n}x")])
            }));
            let policy = TypePolicy {
                strict_type_checking: strict,
                ..TypePolicy::default()
            };
            let owner = pick.get(&names);

            let resolved = TypeResolver::new(&registry, &policy)
                .resolve(&format!("x-{owner}/type"), &format!("{owner}x"))
                .unwrap();
            prop_assert_eq!(&resolved, owner);
        }

        #[test]
        fn resolution_is_deterministic(mime in "[a-z]{1,6}/[a-z]{1,6}", ext in "[a-z]{0,4}") {
            let registry = TypeRegistry::with_defaults();
            let policy = TypePolicy {
                allow_unrecognized_types: true,
                ..TypePolicy::default()
            };
            let resolver = TypeResolver::new(&registry, &policy);
            let first = resolver.resolve(&mime, &ext).unwrap();
            let second = resolver.resolve(&mime, &ext).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
