//! `SELECT *` expansion.
//!
//! SOQL has no wildcard projection. A query whose projection is exactly `*`
//! is rewritten to list the object's fields.

use std::sync::LazyLock;

use playforce_sf_client::security::soql;
use regex_lite::Regex;
use tracing::{debug, warn};

use crate::executor::RequestExecutor;

static SELECT_STAR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*select\s*(\*)\s*from\s+([A-Za-z][A-Za-z0-9_]*)").ok());

/// A `SELECT *` query: the byte range of the `*` and the target object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStar<'a> {
    star: std::ops::Range<usize>,
    pub sobject: &'a str,
}

/// Parse `soql` as a `SELECT * FROM <object> …` query.
pub fn parse_select_star(soql: &str) -> Option<SelectStar<'_>> {
    let re = SELECT_STAR.as_ref()?;
    let caps = re.captures(soql)?;
    let star = caps.get(1)?;
    let sobject = caps.get(2)?;
    Some(SelectStar {
        star: star.range(),
        sobject: sobject.as_str(),
    })
}

/// Replace the `*` with the given fields. Unsafe names are dropped; `None`
/// when nothing is left.
///
/// A `*` written flush against `SELECT` or `FROM` gets a separating space.
pub fn rewrite_projection(soql: &str, select: &SelectStar<'_>, fields: &[&str]) -> Option<String> {
    let projection = soql::build_safe_select(fields)?;
    let head = &soql[..select.star.start];
    let tail = &soql[select.star.end..];
    let mut rewritten = String::with_capacity(soql.len() + projection.len() + 2);
    rewritten.push_str(head);
    if !head.ends_with(char::is_whitespace) {
        rewritten.push(' ');
    }
    rewritten.push_str(&projection);
    if !tail.starts_with(char::is_whitespace) {
        rewritten.push(' ');
    }
    rewritten.push_str(tail);
    Some(rewritten)
}

/// Expand `SELECT *` using the object's describe.
///
/// Never fails: anything that prevents expansion returns the query as given.
pub async fn expand_select_star(executor: &RequestExecutor, soql: &str) -> String {
    let Some(select) = parse_select_star(soql) else {
        return soql.to_string();
    };

    let describe = match executor.describe_object(select.sobject).await {
        Ok(describe) => describe,
        Err(e) => {
            warn!(sobject = select.sobject, error = %e, "Describe failed, running query unexpanded");
            return soql.to_string();
        }
    };

    match rewrite_projection(soql, &select, &describe.field_names()) {
        Some(expanded) => {
            debug!(sobject = select.sobject, fields = describe.fields.len(), "Expanded SELECT *");
            expanded
        }
        None => soql.to_string(),
    }
}
