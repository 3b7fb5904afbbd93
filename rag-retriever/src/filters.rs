//! Scope filter composition to Qdrant `Filter`.
//!
//! All conditions are exact-match and combined conjunctively (`must`): a
//! scoped query narrows the index, it never widens it.

use qdrant_client::qdrant::{Condition, FieldCondition, Filter, Match, condition::ConditionOneOf};
use tracing::debug;

/// Optional retrieval scope.
///
/// Invariant: a module always belongs to a course, so `module_id` can only
/// be set together with `course_id`. The constructors enforce this; the
/// fields stay private.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    course_id: Option<i64>,
    module_id: Option<i64>,
}

impl ScopeFilter {
    /// No scope: general website chat.
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Restrict retrieval to one course.
    pub fn course(course_id: i64) -> Self {
        Self {
            course_id: Some(course_id),
            module_id: None,
        }
    }

    /// Restrict retrieval to one module within a course.
    pub fn module(course_id: i64, module_id: i64) -> Self {
        Self {
            course_id: Some(course_id),
            module_id: Some(module_id),
        }
    }

    pub fn course_id(&self) -> Option<i64> {
        self.course_id
    }

    pub fn module_id(&self) -> Option<i64> {
        self.module_id
    }

    /// Whether any scoping field is set.
    pub fn is_scoped(&self) -> bool {
        self.course_id.is_some()
    }
}

/// Converts a [`ScopeFilter`] to a Qdrant [`Filter`].
///
/// - course scope → `course_id == N`
/// - module scope → `course_id == N` AND `module_id == M`
/// - unscoped → `source == "drupal"`, so general chat only sees website
///   content and never leaks course-internal material
pub fn to_qdrant_filter(scope: &ScopeFilter) -> Filter {
    debug!(
        course_id = ?scope.course_id,
        module_id = ?scope.module_id,
        "filters::to_qdrant_filter"
    );

    let mut must: Vec<Condition> = Vec::new();

    if let Some(course_id) = scope.course_id {
        must.push(integer_eq("course_id", course_id));
        if let Some(module_id) = scope.module_id {
            must.push(integer_eq("module_id", module_id));
        }
    } else {
        must.push(keyword_eq("source", "drupal"));
    }

    Filter {
        must,
        ..Default::default()
    }
}

fn integer_eq(field: &str, value: i64) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Integer(value)),
            }),
            ..Default::default()
        })),
    }
}

fn keyword_eq(field: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: field.to_string(),
            r#match: Some(Match {
                match_value: Some(qdrant_client::qdrant::r#match::MatchValue::Keyword(
                    value.to_string(),
                )),
            }),
            ..Default::default()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::r#match::MatchValue;

    fn field_of(c: &Condition) -> (&str, &MatchValue) {
        match &c.condition_one_of {
            Some(ConditionOneOf::Field(f)) => (
                f.key.as_str(),
                f.r#match
                    .as_ref()
                    .and_then(|m| m.match_value.as_ref())
                    .unwrap(),
            ),
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn course_scope_requires_course_id_only() {
        let f = to_qdrant_filter(&ScopeFilter::course(79));
        assert_eq!(f.must.len(), 1);
        let (key, val) = field_of(&f.must[0]);
        assert_eq!(key, "course_id");
        assert_eq!(val, &MatchValue::Integer(79));
    }

    #[test]
    fn module_scope_requires_both_ids() {
        let f = to_qdrant_filter(&ScopeFilter::module(79, 422));
        assert_eq!(f.must.len(), 2);
        let (k0, v0) = field_of(&f.must[0]);
        let (k1, v1) = field_of(&f.must[1]);
        assert_eq!((k0, v0), ("course_id", &MatchValue::Integer(79)));
        assert_eq!((k1, v1), ("module_id", &MatchValue::Integer(422)));
    }

    #[test]
    fn unscoped_restricts_to_website_source() {
        let f = to_qdrant_filter(&ScopeFilter::unscoped());
        assert_eq!(f.must.len(), 1);
        let (key, val) = field_of(&f.must[0]);
        assert_eq!(key, "source");
        assert_eq!(val, &MatchValue::Keyword("drupal".into()));
    }
}
