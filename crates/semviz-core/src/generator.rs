//! Synthetic commit content: messages, authors, weighted categories.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::commit::CommitCategory;

/// Authors picked for generated commits.
pub const AUTHORS: [&str; 8] = [
    "Alex Chen",
    "Sarah Johnson",
    "Mike Wilson",
    "Emma Davis",
    "Chris Martinez",
    "Lisa Anderson",
    "Tom Brown",
    "Jessica Lee",
];

/// Probability that one auto-commit tick produces a commit.
pub const DEFAULT_COMMIT_PROBABILITY: f64 = 0.3;

/// Relative weight of each category when auto-generating.
const fn weight(category: CommitCategory) -> usize {
    match category {
        CommitCategory::Breaking => 1,
        CommitCategory::Feat => 3,
        CommitCategory::Fix => 5,
        CommitCategory::Docs
        | CommitCategory::Style
        | CommitCategory::Refactor
        | CommitCategory::Test
        | CommitCategory::Chore => 2,
    }
}

/// Canned subjects per category.
pub const fn subjects(category: CommitCategory) -> &'static [&'static str] {
    match category {
        CommitCategory::Breaking => &[
            "remove deprecated API endpoints",
            "change authentication method to OAuth 2.0",
            "update minimum Node.js version to 18",
            "restructure database schema",
            "replace REST API with GraphQL",
        ],
        CommitCategory::Feat => &[
            "add user dashboard",
            "implement dark mode toggle",
            "add export to PDF functionality",
            "introduce real-time notifications",
            "add multi-language support",
        ],
        CommitCategory::Fix => &[
            "resolve memory leak in data processor",
            "fix login redirect loop",
            "correct calculation in billing module",
            "fix responsive layout on mobile",
            "resolve timezone conversion bug",
        ],
        CommitCategory::Docs => &[
            "update API documentation",
            "add contributing guidelines",
            "improve README with examples",
            "document deployment process",
            "add JSDoc comments",
        ],
        CommitCategory::Style => &[
            "format code with prettier",
            "update indentation to 2 spaces",
            "reorganize import statements",
            "fix linting warnings",
            "standardize naming conventions",
        ],
        CommitCategory::Refactor => &[
            "extract reusable components",
            "optimize database queries",
            "simplify authentication flow",
            "restructure folder organization",
            "improve error handling",
        ],
        CommitCategory::Test => &[
            "add unit tests for auth module",
            "increase test coverage to 90%",
            "add E2E tests for checkout flow",
            "update test fixtures",
            "add performance benchmarks",
        ],
        CommitCategory::Chore => &[
            "update dependencies",
            "configure CI/CD pipeline",
            "add pre-commit hooks",
            "update build scripts",
            "optimize bundle size",
        ],
    }
}

/// Content for a commit about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Category.
    pub category: CommitCategory,
    /// Full message, `"<category>: <subject>"`.
    pub message: String,
    /// Author name.
    pub author: String,
}

/// Random source for generated commits.
#[derive(Debug, Clone)]
pub struct CommitGenerator<R = StdRng> {
    rng: R,
    weighted: Vec<CommitCategory>,
    probability: f64,
}

impl CommitGenerator<StdRng> {
    /// Generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> CommitGenerator<R> {
    /// Wrap a random source.
    pub fn new(rng: R) -> Self {
        let weighted = CommitCategory::ALL
            .into_iter()
            .flat_map(|c| std::iter::repeat_n(c, weight(c)))
            .collect();
        Self {
            rng,
            weighted,
            probability: DEFAULT_COMMIT_PROBABILITY,
        }
    }

    /// Set the per-tick commit probability (clamped to `0.0..=1.0`).
    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_COMMIT_PROBABILITY
        };
        self
    }

    /// Build a draft, generating whatever the caller did not supply.
    pub fn draft(
        &mut self,
        category: CommitCategory,
        message: Option<String>,
        author: Option<String>,
    ) -> Draft {
        let message = message.unwrap_or_else(|| {
            let subject = subjects(category)
                .choose(&mut self.rng)
                .copied()
                .unwrap_or("update");
            format!("{category}: {subject}")
        });
        let author = author.unwrap_or_else(|| {
            AUTHORS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(AUTHORS[0])
                .to_string()
        });
        Draft {
            category,
            message,
            author,
        }
    }

    /// Roll for one auto-commit tick.
    ///
    /// Returns a fully generated draft with the configured probability.
    pub fn tick(&mut self) -> Option<Draft> {
        if !self.rng.random_bool(self.probability) {
            return None;
        }
        let category = self
            .weighted
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CommitCategory::Fix);
        Some(self.draft(category, None, None))
    }
}
