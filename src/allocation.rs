use crate::errors::{LedgerError, Result};
use crate::money::Money;
use crate::store::BillingPeriod;
use crate::types::{AllocationResult, PeriodApplication};

/// complete allocation plan, computed before any write occurs
///
/// Separating the computation from the transactional apply keeps the
/// algorithm independently testable and guarantees validation errors leave
/// no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// periods to fund, in the chronological order they are touched
    pub applications: Vec<PeriodApplication>,
    /// single net change to the stored credit balance
    pub credit_delta: Money,
    /// credit balance after the payment is applied
    pub remaining_credit: Money,
}

impl AllocationPlan {
    pub fn total_applied(&self) -> Money {
        self.applications.iter().map(|a| a.amount).sum()
    }

    pub fn into_result(self) -> Result<AllocationResult> {
        AllocationResult::new(self.applications, self.credit_delta, self.remaining_credit)
    }
}

/// distribute one payment across outstanding billing periods
///
/// Available funds are the payment amount plus the current credit balance.
/// Periods are filled in strict increasing chronological order starting
/// from the earliest one not fully paid; partially-paid periods are topped
/// up to full before moving on, and the last period reached may be left
/// partial. Whatever is not applied to a period remains as credit; the
/// plan's `credit_delta` is the net change against the pre-payment balance,
/// so a single payment never produces contradicting ledger entries.
pub fn plan_allocation(
    periods: &[BillingPeriod],
    credit_balance: Money,
    amount: Money,
) -> Result<AllocationPlan> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount { amount });
    }

    let mut outstanding: Vec<&BillingPeriod> =
        periods.iter().filter(|p| p.shortfall().is_positive()).collect();
    outstanding.sort_by_key(|p| p.index);

    let mut available = amount + credit_balance;
    let mut applications = Vec::new();

    for period in outstanding {
        if !available.is_positive() {
            break;
        }
        let applied = available.min(period.shortfall());
        applications.push(PeriodApplication {
            period: period.index,
            amount: applied,
        });
        available -= applied;
    }

    // whatever was not absorbed by periods stays on the credit balance
    let remaining_credit = available;
    let credit_delta = remaining_credit - credit_balance;

    Ok(AllocationPlan {
        applications,
        credit_delta,
        remaining_credit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaidStatus;
    use proptest::prelude::*;

    fn periods(paid: &[i64]) -> Vec<BillingPeriod> {
        paid.iter()
            .enumerate()
            .map(|(i, p)| BillingPeriod {
                index: (i + 1) as u32,
                amount_due: Money::from_minor(1000),
                amount_paid: Money::from_minor(*p),
                payment_ref: None,
            })
            .collect()
    }

    fn apply(periods: &mut [BillingPeriod], plan: &AllocationPlan) {
        for a in &plan.applications {
            let p = periods.iter_mut().find(|p| p.index == a.period).unwrap();
            p.amount_paid += a.amount;
        }
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let ps = periods(&[0, 0, 0]);
        assert!(matches!(
            plan_allocation(&ps, Money::ZERO, Money::ZERO),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(plan_allocation(&ps, Money::ZERO, Money::from_minor(-5)).is_err());
    }

    #[test]
    fn test_spans_periods_and_leaves_last_partial() {
        // periods 1-3 unpaid at 1000 each, no credit, payment 2500
        let mut ps = periods(&[0, 0, 0]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(2500)).unwrap();

        assert_eq!(
            plan.applications,
            vec![
                PeriodApplication { period: 1, amount: Money::from_minor(1000) },
                PeriodApplication { period: 2, amount: Money::from_minor(1000) },
                PeriodApplication { period: 3, amount: Money::from_minor(500) },
            ]
        );
        assert_eq!(plan.credit_delta, Money::ZERO);
        assert_eq!(plan.remaining_credit, Money::ZERO);

        apply(&mut ps, &plan);
        assert_eq!(ps[0].status(), PaidStatus::Paid);
        assert_eq!(ps[1].status(), PaidStatus::Paid);
        assert_eq!(ps[2].status(), PaidStatus::Partial);
    }

    #[test]
    fn test_overflow_becomes_positive_credit() {
        // payment 3500 against 3000 outstanding
        let ps = periods(&[0, 0, 0]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(3500)).unwrap();

        assert_eq!(plan.total_applied(), Money::from_minor(3000));
        assert_eq!(plan.credit_delta, Money::from_minor(500));
        assert_eq!(plan.remaining_credit, Money::from_minor(500));
    }

    #[test]
    fn test_existing_credit_is_drawn_down() {
        // credit 200, only period 1 outstanding at 1000, payment 900
        let ps = periods(&[0, 1000, 1000]);
        let plan = plan_allocation(&ps, Money::from_minor(200), Money::from_minor(900)).unwrap();

        assert_eq!(
            plan.applications,
            vec![PeriodApplication { period: 1, amount: Money::from_minor(1000) }]
        );
        // net change from the pre-existing 200 down to 100
        assert_eq!(plan.credit_delta, Money::from_minor(-100));
        assert_eq!(plan.remaining_credit, Money::from_minor(100));
    }

    #[test]
    fn test_exact_payment_pays_one_period_with_zero_delta() {
        let ps = periods(&[0, 1000, 1000]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(1000)).unwrap();

        assert_eq!(plan.applications.len(), 1);
        assert_eq!(plan.applications[0].amount, Money::from_minor(1000));
        assert_eq!(plan.credit_delta, Money::ZERO);
    }

    #[test]
    fn test_pure_overpayment_when_nothing_outstanding() {
        let ps = periods(&[1000, 1000, 1000]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(750)).unwrap();

        assert!(plan.applications.is_empty());
        assert_eq!(plan.credit_delta, Money::from_minor(750));
        assert_eq!(plan.remaining_credit, Money::from_minor(750));
    }

    #[test]
    fn test_partial_payment_no_credit_touches_only_first_period() {
        let ps = periods(&[0, 0, 0]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(300)).unwrap();

        assert_eq!(
            plan.applications,
            vec![PeriodApplication { period: 1, amount: Money::from_minor(300) }]
        );
        assert_eq!(plan.credit_delta, Money::ZERO);
    }

    #[test]
    fn test_partial_period_topped_up_before_advancing() {
        // period 2 partially paid; allocation starts at period 1's gap? no —
        // period 1 is already full here, so period 2 is topped up first
        let ps = periods(&[1000, 400, 0]);
        let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(800)).unwrap();

        assert_eq!(
            plan.applications,
            vec![
                PeriodApplication { period: 2, amount: Money::from_minor(600) },
                PeriodApplication { period: 3, amount: Money::from_minor(200) },
            ]
        );
    }

    #[test]
    fn test_credit_alone_can_fund_leading_period() {
        // small payment plus large credit crosses several periods
        let ps = periods(&[0, 0, 0]);
        let plan =
            plan_allocation(&ps, Money::from_minor(1900), Money::from_minor(100)).unwrap();

        assert_eq!(plan.total_applied(), Money::from_minor(2000));
        assert_eq!(plan.credit_delta, Money::from_minor(-1900));
        assert_eq!(plan.remaining_credit, Money::ZERO);
    }

    proptest! {
        // conservation at plan level: everything the payment brought in is
        // either applied to periods or reflected in the credit delta
        #[test]
        fn prop_plan_conserves_funds(
            paid in proptest::collection::vec(0i64..=1000, 1..=12),
            credit in 0i64..3000,
            amount in 1i64..20_000,
        ) {
            let ps = periods(&paid);
            let plan = plan_allocation(
                &ps,
                Money::from_minor(credit),
                Money::from_minor(amount),
            ).unwrap();

            prop_assert_eq!(
                plan.total_applied() + plan.credit_delta,
                Money::from_minor(amount)
            );
        }

        // chronological-order property: touched periods form a contiguous
        // prefix of the outstanding periods, and every period before the
        // last touched one ends fully paid
        #[test]
        fn prop_touched_periods_are_outstanding_prefix(
            paid in proptest::collection::vec(0i64..=1000, 1..=12),
            amount in 1i64..20_000,
        ) {
            let ps = periods(&paid);
            let plan = plan_allocation(&ps, Money::ZERO, Money::from_minor(amount)).unwrap();

            let outstanding: Vec<u32> = ps
                .iter()
                .filter(|p| p.shortfall().is_positive())
                .map(|p| p.index)
                .collect();
            let touched: Vec<u32> = plan.applications.iter().map(|a| a.period).collect();

            prop_assert_eq!(&outstanding[..touched.len()], &touched[..]);

            // all but the last touched period must be filled to the brim
            for a in plan.applications.iter().rev().skip(1) {
                let p = ps.iter().find(|p| p.index == a.period).unwrap();
                prop_assert_eq!(p.shortfall(), a.amount);
            }
        }
    }
}
