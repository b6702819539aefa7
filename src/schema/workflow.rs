//! Workflow vocabulary: the scan action, its backends and trigger events
//!
//! These definitions mirror the embedded JSON schema and feed the messages
//! produced by the error translator.

/// Action reference of the security scan step, without the version
pub const SCAN_ACTION: &str = "blackduck-inc/black-duck-security-scan";

/// Version used in suggested snippets
pub const SCAN_ACTION_EXAMPLE: &str = "blackduck-inc/black-duck-security-scan@v2";

/// Vendor namespace searched for in offending values
pub const VENDOR_NAMESPACE: &str = "blackduck";

/// A scan backend and the `with` inputs it requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    pub name: &'static str,
    pub required_inputs: &'static [&'static str],
}

/// Supported scan backends, in the order of the schema's `anyOf`
pub const BACKENDS: &[Backend] = &[
    Backend {
        name: "Polaris",
        required_inputs: &["polaris_server_url", "polaris_access_token"],
    },
    Backend {
        name: "Black Duck SCA",
        required_inputs: &["blackducksca_url", "blackducksca_token"],
    },
    Backend {
        name: "Coverity",
        required_inputs: &["coverity_url", "coverity_user", "coverity_passphrase"],
    },
    Backend {
        name: "SRM",
        required_inputs: &["srm_url", "srm_apikey"],
    },
];

/// Events accepted as a bare `on:` string or list entry
pub const TRIGGER_EVENTS: &[&str] = &[
    "push",
    "pull_request",
    "pull_request_target",
    "workflow_dispatch",
    "workflow_call",
    "release",
    "merge_group",
    "issues",
    "issue_comment",
    "pull_request_review",
    "pull_request_review_comment",
];

/// Check if a `uses` value references the security scan action
pub fn is_scan_action(uses: &str) -> bool {
    uses.strip_prefix(SCAN_ACTION)
        .map_or(false, |rest| rest.starts_with('@'))
}

/// Check if an event name is a recognized trigger
pub fn is_trigger_event(name: &str) -> bool {
    TRIGGER_EVENTS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_scan_action() {
        assert!(is_scan_action("blackduck-inc/black-duck-security-scan@v2"));
        assert!(is_scan_action("blackduck-inc/black-duck-security-scan@v2.1.0"));
        assert!(!is_scan_action("blackduck-inc/black-duck-security-scan"));
        assert!(!is_scan_action("blackduck-inc/black-duck-security-scan-fork@v1"));
        assert!(!is_scan_action("actions/checkout@v4"));
    }

    #[test]
    fn test_is_trigger_event() {
        assert!(is_trigger_event("push"));
        assert!(is_trigger_event("workflow_dispatch"));
        assert!(!is_trigger_event("schedule"));
        assert!(!is_trigger_event("commit"));
    }

    #[test]
    fn test_every_backend_requires_a_url() {
        for backend in BACKENDS {
            assert!(
                backend.required_inputs.iter().any(|input| input.ends_with("_url")),
                "{} has no URL input",
                backend.name
            );
        }
    }
}
