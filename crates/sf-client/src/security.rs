//! Identifier safety helpers for Salesforce API operations.
//!
//! Object and field names that end up inside SOQL text or URL paths are
//! validated here before use.
//!
//! ```rust
//! use playforce_sf_client::security::soql;
//!
//! assert!(soql::is_safe_sobject_name("Account"));
//! assert!(!soql::is_safe_sobject_name("Account/../../limits"));
//! ```

/// SOQL identifier utilities.
pub mod soql {
    /// Validate that a field name contains only safe characters.
    ///
    /// Field names must start with a letter and contain only alphanumerics
    /// and underscores (which covers `__c` / `__r` suffixes).
    ///
    /// # Example
    ///
    /// ```rust
    /// use playforce_sf_client::security::soql;
    ///
    /// assert!(soql::is_safe_field_name("Custom_Field__c"));
    /// assert!(!soql::is_safe_field_name("Bad'; DROP TABLE--"));
    /// ```
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    /// Validate a list of field names and return only safe ones.
    pub fn filter_safe_fields<'a>(
        fields: impl IntoIterator<Item = &'a str>,
    ) -> impl Iterator<Item = &'a str> {
        fields.into_iter().filter(|f| is_safe_field_name(f))
    }

    /// Validate that a SObject name is safe.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }

    /// Build a SELECT field list, dropping unsafe names and joining the rest
    /// with `", "`. Returns `None` if no safe fields remain.
    ///
    /// # Example
    ///
    /// ```rust
    /// use playforce_sf_client::security::soql;
    ///
    /// let select = soql::build_safe_select(&["Id", "Name", "Bad'--", "Email"]);
    /// assert_eq!(select, Some("Id, Name, Email".to_string()));
    /// ```
    #[must_use]
    pub fn build_safe_select(fields: &[&str]) -> Option<String> {
        let safe: Vec<_> = filter_safe_fields(fields.iter().copied()).collect();
        if safe.is_empty() {
            None
        } else {
            Some(safe.join(", "))
        }
    }
}
