use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    Condition,
};

use crate::database::models::{job, subscription};

/// Job field a term group is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Location,
    Company,
    Role,
}

impl FilterField {
    const fn column(self) -> job::Column {
        match self {
            Self::Location => job::Column::Location,
            Self::Company => job::Column::Company,
            Self::Role => job::Column::Role,
        }
    }

    fn value(self, job: &job::Model) -> &str {
        match self {
            Self::Location => &job.location,
            Self::Company => &job.company,
            Self::Role => &job.role,
        }
    }
}

/// Terms of which at least one must occur in a field, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermGroup {
    field: FilterField,
    terms: Vec<String>,
}

impl TermGroup {
    /// Trims the terms and drops empty ones.
    pub fn new<S: AsRef<str>>(field: FilterField, terms: impl IntoIterator<Item = S>) -> Self {
        Self {
            field,
            terms: terms
                .into_iter()
                .map(|term| term.as_ref().trim().to_ascii_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn condition(&self) -> Condition {
        self.terms
            .iter()
            .fold(Condition::any(), |condition, term| {
                condition.add(
                    Expr::expr(Func::lower(Expr::col((job::Entity, self.field.column()))))
                        .like(LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\')),
                )
            })
    }

    fn matches(&self, job: &job::Model) -> bool {
        let value = self.field.value(job).to_ascii_lowercase();
        self.terms.iter().any(|term| value.contains(term.as_str()))
    }
}

/// Conjunction of term groups; an empty filter accepts every job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    groups: Vec<TermGroup>,
}

impl SubscriptionFilter {
    pub fn new(groups: impl IntoIterator<Item = TermGroup>) -> Self {
        Self {
            groups: groups.into_iter().filter(|group| !group.is_empty()).collect(),
        }
    }

    #[must_use]
    pub fn from_subscription(subscription: &subscription::Model) -> Self {
        Self::new([
            TermGroup::new(FilterField::Location, subscription.locations.iter()),
            TermGroup::new(FilterField::Company, subscription.companies.iter()),
            TermGroup::new(FilterField::Role, subscription.roles.iter()),
        ])
    }

    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.groups.is_empty()
    }

    /// Parameterized SQL condition equivalent to [`Self::matches`].
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.groups
            .iter()
            .fold(Condition::all(), |condition, group| {
                condition.add(group.condition())
            })
    }

    #[must_use]
    pub fn matches(&self, job: &job::Model) -> bool {
        self.groups.iter().all(|group| group.matches(job))
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
