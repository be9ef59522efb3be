//! Dashboard and compliance aggregates over a company's contracts.

use chrono::{Days, Months, NaiveDate};

use pactoria_core::responses::{ComplianceOverview, CountByKey, DashboardStats, MonthlyCount};

use crate::error::DatabaseError;
use crate::helpers::{format_date, get_count, get_opt_f64};
use crate::repos::audit::AuditFilter;
use crate::service::PactoriaService;

/// Window used for the dashboard's "expiring soon" figure.
pub const EXPIRING_WINDOW_DAYS: u64 = 30;
const MONTHS_SHOWN: u32 = 12;
const RECENT_ACTIVITY: u32 = 10;

/// The `MONTHS_SHOWN` month keys ending with `today`'s month, oldest first.
fn month_keys(today: NaiveDate) -> Vec<String> {
    (0..MONTHS_SHOWN)
        .rev()
        .filter_map(|back| today.checked_sub_months(Months::new(back)))
        .map(|d| d.format("%Y-%m").to_string())
        .collect()
}

impl PactoriaService {
    async fn count_by(&self, company_id: &str, column: &str) -> Result<Vec<CountByKey>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {column}, COUNT(*) FROM contracts WHERE company_id = ?1
                     GROUP BY {column} ORDER BY COUNT(*) DESC, {column}"
                ),
                [company_id],
            )
            .await?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            counts.push(CountByKey {
                key: row.get(0)?,
                count: get_count(&row, 1)?,
            });
        }
        Ok(counts)
    }

    /// Headline figures for the dashboard as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn dashboard(&self, company_id: &str, today: NaiveDate) -> Result<DashboardStats, DatabaseError> {
        let by_status = self.count_by(company_id, "status").await?;
        let by_type = self.count_by(company_id, "contract_type").await?;
        let total_contracts = by_status.iter().map(|c| c.count).sum();

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COALESCE(SUM(contract_value), 0.0), AVG(contract_value)
                 FROM contracts WHERE company_id = ?1 AND status = 'active'",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let active_contract_value = get_opt_f64(&row, 0)?.unwrap_or(0.0);
        let average_contract_value = get_opt_f64(&row, 1)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT AVG(compliance_score) FROM contracts WHERE company_id = ?1",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let average_compliance_score = get_opt_f64(&row, 0)?;

        let horizon = today
            .checked_add_days(Days::new(EXPIRING_WINDOW_DAYS))
            .unwrap_or(today);
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM contracts
                 WHERE company_id = ?1 AND status = 'active' AND end_date BETWEEN ?2 AND ?3",
                [company_id, format_date(today).as_str(), format_date(horizon).as_str()],
            )
            .await?;
        let expiring_soon = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let keys = month_keys(today);
        let mut monthly_created: Vec<MonthlyCount> = keys
            .iter()
            .map(|k| MonthlyCount {
                month: k.clone(),
                count: 0,
            })
            .collect();
        if let Some(first) = keys.first() {
            let mut rows = self
                .db()
                .conn()
                .query(
                    "SELECT substr(created_at, 1, 7) AS month, COUNT(*) FROM contracts
                     WHERE company_id = ?1 AND substr(created_at, 1, 7) >= ?2
                     GROUP BY month",
                    [company_id, first.as_str()],
                )
                .await?;
            while let Some(row) = rows.next().await? {
                let month: String = row.get(0)?;
                if let Some(slot) = monthly_created.iter_mut().find(|m| m.month == month) {
                    slot.count = get_count(&row, 1)?;
                }
            }
        }

        let recent_activity = self
            .query_audit(&AuditFilter {
                company_id: Some(company_id.to_string()),
                limit: Some(RECENT_ACTIVITY),
                ..AuditFilter::default()
            })
            .await?;

        Ok(DashboardStats {
            total_contracts,
            by_status,
            by_type,
            active_contract_value,
            average_contract_value,
            average_compliance_score,
            expiring_soon,
            monthly_created,
            recent_activity,
        })
    }

    /// Contracts bucketed by compliance score.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn compliance_overview(&self, company_id: &str) -> Result<ComplianceOverview, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT
                     COUNT(compliance_score),
                     AVG(compliance_score),
                     COALESCE(SUM(compliance_score >= 0.8), 0),
                     COALESCE(SUM(compliance_score >= 0.6 AND compliance_score < 0.8), 0),
                     COALESCE(SUM(compliance_score < 0.6), 0),
                     COALESCE(SUM(compliance_score IS NULL), 0)
                 FROM contracts WHERE company_id = ?1",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(ComplianceOverview {
            scored_contracts: get_count(&row, 0)?,
            average_score: get_opt_f64(&row, 1)?,
            high: get_count(&row, 2)?,
            medium: get_count(&row, 3)?,
            low: get_count(&row, 4)?,
            unscored: get_count(&row, 5)?,
        })
    }
}
