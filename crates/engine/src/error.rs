//! Registration error taxonomy.
//!
//! The `Display` text of these errors is part of the observable contract:
//! it is what reaches the diagnostic monitor when a handler is rejected.

use thiserror::Error;

/// Why a handler registration was rejected.
///
/// Registration is atomic per handler: the first error rejects the whole
/// handler and no callable, family, or fact state is retained for it.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    /// Two slots of one callable resolved to the same parameter family.
    #[error("Duplicate parameter types in '{signature}': '{second}' and '{first}' are both '{type_name}'.")]
    DuplicateParameterTypes {
        /// Signature of the offending method.
        signature: String,
        /// Name of the parameter registered first.
        first: String,
        /// Name of the parameter that collided with it.
        second: String,
        /// Display name of the shared type.
        type_name: String,
    },

    /// A new parameter type's generalization closure intersects an existing
    /// family's closure.
    #[error("Parameter type '{type_name}' of '{signature}' overlaps with the existing parameter type '{existing}' (first used by {first_usage}): common types are {common}.")]
    OverlappingFamilies {
        /// Display name of the newly requested type.
        type_name: String,
        /// Signature of the method requesting it.
        signature: String,
        /// Display name of the existing family's declared type.
        existing: String,
        /// First usage site recorded for the existing family.
        first_usage: String,
        /// Sorted, quoted, comma-joined names of the intersecting types.
        common: String,
    },

    /// The parameter type cannot be a meaningful fact key.
    #[error("Parameter type '{type_name}' of '{signature}' cannot be used as a fact requirement: it is {reason}.")]
    InvalidParameterType {
        /// Display name of the rejected type.
        type_name: String,
        /// Signature of the method requesting it.
        signature: String,
        /// Shape description, e.g. "an array type".
        reason: &'static str,
    },

    /// An intrinsic parameter type appeared more than once in one callable.
    #[error("Intrinsic parameter type '{type_name}' appears more than once in '{signature}'.")]
    RepeatedIntrinsic {
        /// Display name of the intrinsic type.
        type_name: String,
        /// Signature of the offending method.
        signature: String,
    },

    /// A marked method is a still-open generic method.
    #[error("Method '{signature}' is an open generic method; generic handler methods cannot be registered.")]
    OpenGenericMethod {
        /// Signature of the offending method.
        signature: String,
    },

    /// A marked method is asynchronous.
    #[error("Method '{signature}' is asynchronous; the engine only executes synchronous methods.")]
    AsyncMethod {
        /// Signature of the offending method.
        signature: String,
    },

    /// Two loop-scoped parameters of one callable resolved to different
    /// hierarchy roots.
    #[error("Loop parameters of '{signature}' resolve to different hierarchy roots:\n  '{first_param}' ('{first_type}') has root '{first_root}'\n  '{second_param}' ('{second_type}') has root '{second_root}'")]
    MismatchedLoopRoots {
        /// Signature of the offending method.
        signature: String,
        /// Name of the first loop parameter.
        first_param: String,
        /// Declared type of the first loop parameter.
        first_type: String,
        /// Resolved root of the first loop parameter.
        first_root: String,
        /// Name of the conflicting loop parameter.
        second_param: String,
        /// Declared type of the conflicting loop parameter.
        second_type: String,
        /// Resolved root of the conflicting loop parameter.
        second_root: String,
    },

    /// The loop-parent chain of a type never reaches a root.
    #[error("Loop hierarchy of '{type_name}' never reaches a root: parent cycle detected.")]
    HierarchyCycle {
        /// Display name of the type whose chain cycles.
        type_name: String,
    },

    /// The metadata provider has no descriptor for a type.
    #[error("Type '{type_name}' is not described by the metadata provider.")]
    UndescribedType {
        /// Best-effort display name of the unknown type.
        type_name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_names_second_parameter_first() {
        let err = RegistrationError::DuplicateParameterTypes {
            signature: "Setup.apply(Config a, Config b)".to_string(),
            first: "a".to_string(),
            second: "b".to_string(),
            type_name: "Config".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate parameter types in 'Setup.apply(Config a, Config b)': 'b' and 'a' are both 'Config'."
        );
    }

    #[test]
    fn test_loop_root_message_is_multi_line() {
        let err = RegistrationError::MismatchedLoopRoots {
            signature: "Setup.walk(ConfigNode cfg, EnvNode env)".to_string(),
            first_param: "cfg".to_string(),
            first_type: "ConfigNode".to_string(),
            first_root: "ConfigRoot".to_string(),
            second_param: "env".to_string(),
            second_type: "EnvNode".to_string(),
            second_root: "EnvRoot".to_string(),
        };
        let text = err.to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("'ConfigRoot'"));
        assert!(text.contains("'EnvRoot'"));
        assert!(text.contains("'cfg'"));
        assert!(text.contains("'env'"));
    }
}
