use api_types::{
    budget::Budget,
    expense::{Expense, ExpenseNew},
    stats::ExpenseStats,
};

use crate::{
    error::{Error, Result},
    gateway::ExpenseApi,
};

/// Budget applied when the server has no (positive) budget record.
pub const FALLBACK_BUDGET: f64 = 5000.0;

/// Percentage of budget above which the dashboard warns.
pub const WARN_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
}

/// The effective monthly budget, tagged by where it came from.
///
/// A server record with a positive amount is `Set`; an absent or
/// non-positive record falls back to [`FALLBACK_BUDGET`]. The tag lets the
/// UI tell a user-chosen budget from the default instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetAmount {
    Set(f64),
    Fallback(f64),
}

impl BudgetAmount {
    pub fn value(self) -> f64 {
        match self {
            Self::Set(amount) | Self::Fallback(amount) => amount,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    fn from_record(record: Option<Budget>) -> Self {
        match record {
            Some(budget) if budget.amount > 0.0 => Self::Set(budget.amount),
            _ => Self::Fallback(FALLBACK_BUDGET),
        }
    }
}

/// Display state of the budget usage bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLevel {
    Neutral,
    ApproachingLimit,
    Exceeded,
}

struct Loaded {
    expenses: Vec<Expense>,
    budget: Option<Budget>,
    stats: ExpenseStats,
}

/// Composes the expense list, the budget and the server stats into the
/// dashboard view state, and orchestrates mutations.
///
/// Every mutation is followed by an unconditional full reload: the stats are
/// server-computed, so an optimistic local edit would silently diverge from
/// them. Loads are all-or-nothing: a failed load keeps the previous state
/// instead of flashing an empty dashboard.
pub struct Dashboard<G> {
    gateway: G,
    phase: Phase,
    expenses: Vec<Expense>,
    budget: BudgetAmount,
    stats: Option<ExpenseStats>,
    /// Monotonic load token: results from a load that was superseded by a
    /// newer one are discarded instead of overwriting fresher state.
    generation: u64,
}

impl<G: ExpenseApi> Dashboard<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            phase: Phase::Loading,
            expenses: Vec::new(),
            budget: BudgetAmount::Fallback(FALLBACK_BUDGET),
            stats: None,
            generation: 0,
        }
    }

    /// Fetches expenses, budget and stats concurrently and applies them
    /// atomically. If any of the three fails the whole load fails and the
    /// prior state is retained.
    pub async fn load_data(&mut self) -> Result<()> {
        let generation = self.begin_load();
        match Self::fetch(&self.gateway).await {
            Ok(loaded) => {
                self.apply(generation, loaded);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("dashboard load failed: {err}");
                self.settle(generation);
                Err(err)
            }
        }
    }

    /// Creates the expense, then reloads everything. No optimistic insert.
    pub async fn add_expense(&mut self, input: ExpenseNew) -> Result<()> {
        self.gateway.create_expense(input).await?;
        self.load_data().await
    }

    /// Deletes the expense, then reloads everything. A failed delete leaves
    /// the list untouched.
    pub async fn delete_expense(&mut self, id: &str) -> Result<()> {
        self.gateway.delete_expense(id).await?;
        self.load_data().await
    }

    /// Upserts the budget, then reloads everything. Rejects non-positive
    /// amounts (NaN included) before the gateway is ever called.
    pub async fn update_budget(&mut self, amount: f64) -> Result<()> {
        if !(amount > 0.0) {
            return Err(Error::Validation("budget must be positive".into()));
        }
        self.gateway.update_budget(amount).await?;
        self.load_data().await
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn budget(&self) -> BudgetAmount {
        self.budget
    }

    pub fn stats(&self) -> Option<&ExpenseStats> {
        self.stats.as_ref()
    }

    /// Sum of the in-memory expenses, recomputed on every call.
    ///
    /// This deliberately ignores `stats.total_expenses`: the displayed total
    /// must be driven by the expense collection it sits next to.
    pub fn total_spent(&self) -> f64 {
        self.expenses.iter().map(|expense| expense.amount).sum()
    }

    pub fn remaining(&self) -> f64 {
        self.budget.value() - self.total_spent()
    }

    pub fn percent_used(&self) -> f64 {
        self.total_spent() / self.budget.value() * 100.0
    }

    pub fn budget_level(&self) -> BudgetLevel {
        let percent = self.percent_used();
        if percent >= 100.0 {
            BudgetLevel::Exceeded
        } else if percent > WARN_THRESHOLD {
            BudgetLevel::ApproachingLimit
        } else {
            BudgetLevel::Neutral
        }
    }

    /// Category with the largest server-computed sum, for the stat cards.
    pub fn top_category(&self) -> Option<(&str, f64)> {
        let stats = self.stats.as_ref()?;
        stats
            .category_breakdown
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(category, amount)| (category.as_str(), *amount))
    }

    fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.generation
    }

    async fn fetch(gateway: &G) -> Result<Loaded> {
        let (expenses, budget, stats) =
            tokio::try_join!(gateway.expenses(), gateway.budget(), gateway.stats())?;
        Ok(Loaded {
            expenses,
            budget,
            stats,
        })
    }

    fn apply(&mut self, generation: u64, loaded: Loaded) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "discarding stale load");
            return;
        }
        self.expenses = loaded.expenses;
        self.budget = BudgetAmount::from_record(loaded.budget);
        self.stats = Some(loaded.stats);
        self.phase = Phase::Ready;
    }

    fn settle(&mut self, generation: u64) {
        if generation == self.generation {
            self.phase = Phase::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use api_types::expense::ExpenseUpdate;
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn expense(id: &str, category: &str, amount: f64) -> Expense {
        Expense {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            category: category.to_string(),
            amount,
            note: None,
            date: NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stats_for(expenses: &[Expense]) -> ExpenseStats {
        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let mut categories = BTreeMap::new();
        for e in expenses {
            *categories.entry(e.category.clone()).or_insert(0.0) += e.amount;
        }
        ExpenseStats {
            total_expenses: total,
            expense_count: expenses.len() as u64,
            category_breakdown: categories,
            monthly_breakdown: BTreeMap::new(),
            average_expense: if expenses.is_empty() {
                0.0
            } else {
                total / expenses.len() as f64
            },
        }
    }

    #[derive(Default)]
    struct FakeApi {
        expenses: Mutex<Vec<Expense>>,
        budget: Mutex<Option<Budget>>,
        fail_reads: std::sync::atomic::AtomicBool,
        fail_delete: std::sync::atomic::AtomicBool,
        read_calls: AtomicUsize,
        budget_updates: AtomicUsize,
    }

    impl FakeApi {
        fn with_budget(amount: f64) -> Self {
            let api = Self::default();
            *api.budget.lock().unwrap() = Some(Budget {
                user_id: "u-1".to_string(),
                amount,
                updated_at: None,
            });
            api
        }

        fn push(&self, e: Expense) {
            self.expenses.lock().unwrap().push(e);
        }

        fn api_down(&self) -> Error {
            Error::Api {
                status: 500,
                message: "boom".to_string(),
            }
        }
    }

    impl ExpenseApi for &FakeApi {
        async fn expenses(&self) -> Result<Vec<Expense>> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(self.api_down());
            }
            Ok(self.expenses.lock().unwrap().clone())
        }

        async fn create_expense(&self, new: ExpenseNew) -> Result<Expense> {
            let created = expense(
                &format!("e-{}", self.expenses.lock().unwrap().len() + 1),
                &new.category,
                new.amount,
            );
            self.push(created.clone());
            Ok(created)
        }

        async fn update_expense(&self, _id: &str, _update: ExpenseUpdate) -> Result<Expense> {
            unimplemented!("not exercised here")
        }

        async fn delete_expense(&self, id: &str) -> Result<()> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(Error::Api {
                    status: 404,
                    message: "not found".to_string(),
                });
            }
            self.expenses.lock().unwrap().retain(|e| e.id != id);
            Ok(())
        }

        async fn budget(&self) -> Result<Option<Budget>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(self.api_down());
            }
            Ok(self.budget.lock().unwrap().clone())
        }

        async fn update_budget(&self, amount: f64) -> Result<Budget> {
            self.budget_updates.fetch_add(1, Ordering::SeqCst);
            let budget = Budget {
                user_id: "u-1".to_string(),
                amount,
                updated_at: Some(Utc::now()),
            };
            *self.budget.lock().unwrap() = Some(budget.clone());
            Ok(budget)
        }

        async fn stats(&self) -> Result<ExpenseStats> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(self.api_down());
            }
            Ok(stats_for(&self.expenses.lock().unwrap()))
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn small_spend_is_neutral() {
        let api = FakeApi::with_budget(5000.0);
        api.push(expense("e-1", "Food", 120.50));
        api.push(expense("e-2", "Transportation", 45.00));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        assert_eq!(dash.phase(), Phase::Ready);
        assert_close(dash.total_spent(), 165.50);
        assert_close(dash.remaining(), 4834.50);
        assert_close(dash.percent_used(), 3.31);
        assert_eq!(dash.budget_level(), BudgetLevel::Neutral);
        assert_eq!(dash.budget(), BudgetAmount::Set(5000.0));
    }

    #[tokio::test]
    async fn usage_at_85_percent_is_approaching_limit() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Bills", 850.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        assert_close(dash.percent_used(), 85.0);
        assert_eq!(dash.budget_level(), BudgetLevel::ApproachingLimit);
    }

    #[tokio::test]
    async fn spending_the_full_budget_is_exceeded() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Shopping", 1000.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        assert_close(dash.percent_used(), 100.0);
        assert_eq!(dash.budget_level(), BudgetLevel::Exceeded);
    }

    #[tokio::test]
    async fn budget_level_boundaries_at_80_and_100() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Other", 800.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();
        // Exactly 80% stays neutral.
        assert_eq!(dash.budget_level(), BudgetLevel::Neutral);

        api.push(expense("e-2", "Other", 0.01));
        dash.load_data().await.unwrap();
        assert_eq!(dash.budget_level(), BudgetLevel::ApproachingLimit);

        api.push(expense("e-3", "Other", 199.98));
        dash.load_data().await.unwrap();
        // 999.99 of 1000 is still only approaching.
        assert_eq!(dash.budget_level(), BudgetLevel::ApproachingLimit);

        api.push(expense("e-4", "Other", 0.011));
        dash.load_data().await.unwrap();
        assert_eq!(dash.budget_level(), BudgetLevel::Exceeded);
    }

    #[tokio::test]
    async fn total_spent_is_recomputed_from_expenses_not_stats() {
        let api = FakeApi::with_budget(5000.0);
        api.push(expense("e-1", "Food", 10.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();
        assert_close(dash.total_spent(), 10.0);

        dash.add_expense(ExpenseNew {
            category: "Food".to_string(),
            amount: 15.0,
            note: None,
            date: NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
        })
        .await
        .unwrap();

        // Recomputed after the mutation's reload, never cached stale.
        assert_close(dash.total_spent(), 25.0);
        assert_eq!(dash.expenses().len(), 2);

        // Even a lying server total does not leak into total_spent.
        let divergent = dash.stats().unwrap().total_expenses;
        assert_close(divergent, 25.0);
        dash.stats.as_mut().unwrap().total_expenses = 9999.0;
        assert_close(dash.total_spent(), 25.0);
    }

    #[tokio::test]
    async fn update_budget_rejects_non_positive_without_calling_gateway() {
        let api = FakeApi::with_budget(1000.0);
        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();
        let reads_before = api.read_calls.load(Ordering::SeqCst);

        for bad in [0.0, -10.0, f64::NAN] {
            let err = dash.update_budget(bad).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }

        assert_eq!(api.budget_updates.load(Ordering::SeqCst), 0);
        // No reload was triggered either.
        assert_eq!(api.read_calls.load(Ordering::SeqCst), reads_before);

        dash.update_budget(1500.0).await.unwrap();
        assert_eq!(api.budget_updates.load(Ordering::SeqCst), 1);
        assert_eq!(dash.budget(), BudgetAmount::Set(1500.0));
    }

    #[tokio::test]
    async fn failed_delete_leaves_expense_list_unchanged() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Food", 10.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();
        api.fail_delete.store(true, Ordering::SeqCst);

        let err = dash.delete_expense("e-1").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, .. }));
        assert_eq!(dash.expenses().len(), 1);
        assert_eq!(dash.expenses()[0].id, "e-1");
    }

    #[tokio::test]
    async fn successful_delete_reloads() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Food", 10.0));
        api.push(expense("e-2", "Bills", 20.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        dash.delete_expense("e-1").await.unwrap();
        assert_eq!(dash.expenses().len(), 1);
        assert_close(dash.total_spent(), 20.0);
    }

    #[tokio::test]
    async fn failed_load_retains_previous_state() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Food", 10.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        api.fail_reads.store(true, Ordering::SeqCst);
        let err = dash.load_data().await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));

        // Prior data survives, and the dashboard is not stuck loading.
        assert_eq!(dash.expenses().len(), 1);
        assert_eq!(dash.budget(), BudgetAmount::Set(1000.0));
        assert!(dash.stats().is_some());
        assert_eq!(dash.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn absent_budget_is_tagged_fallback() {
        let api = FakeApi::default();
        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        assert_eq!(dash.budget(), BudgetAmount::Fallback(FALLBACK_BUDGET));
        assert!(dash.budget().is_fallback());
    }

    #[tokio::test]
    async fn zero_amount_budget_record_is_tagged_fallback() {
        let api = FakeApi::with_budget(0.0);
        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        assert_eq!(dash.budget(), BudgetAmount::Fallback(FALLBACK_BUDGET));
    }

    #[tokio::test]
    async fn stale_load_results_are_discarded() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Food", 10.0));

        let mut dash = Dashboard::new(&api);
        let first = dash.begin_load();
        let first_snapshot = Dashboard::fetch(&dash.gateway).await.unwrap();

        api.push(expense("e-2", "Food", 90.0));
        let second = dash.begin_load();
        let second_snapshot = Dashboard::fetch(&dash.gateway).await.unwrap();

        // Newer load lands first; the older result must not clobber it.
        dash.apply(second, second_snapshot);
        dash.apply(first, first_snapshot);

        assert_eq!(dash.expenses().len(), 2);
        assert_close(dash.total_spent(), 100.0);
        assert_eq!(dash.phase(), Phase::Ready);

        // A stale error settle does not flip the phase back either.
        dash.settle(first);
        assert_eq!(dash.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn top_category_follows_server_breakdown() {
        let api = FakeApi::with_budget(1000.0);
        api.push(expense("e-1", "Food", 10.0));
        api.push(expense("e-2", "Bills", 200.0));
        api.push(expense("e-3", "Food", 50.0));

        let mut dash = Dashboard::new(&api);
        dash.load_data().await.unwrap();

        let (category, amount) = dash.top_category().unwrap();
        assert_eq!(category, "Bills");
        assert_close(amount, 200.0);
    }
}
