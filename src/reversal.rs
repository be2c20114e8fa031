use crate::errors::{LedgerError, Result};
use crate::money::Money;
use crate::store::BillingPeriod;
use crate::types::{AllocationResult, PeriodApplication, ReversalOutcome};

/// complete inverse of a stored allocation, computed before any write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// amounts actually subtracted per period (post-clamp)
    pub subtractions: Vec<PeriodApplication>,
    /// single ledger entry to append: the negated original credit delta,
    /// plus any amount redirected by clamping (zero means omit the entry)
    pub ledger_delta: Money,
    /// portion of the original applications that could not be subtracted
    pub redirected: Money,
    pub outcome: ReversalOutcome,
}

/// compute the exact inverse of a previously-applied allocation
///
/// Each period application is subtracted from the period's `amount_paid`.
/// If intervening edits drained a period below the originally-applied
/// amount, the subtraction clamps at zero and the excess is redirected to
/// the credit ledger instead, flagged `PartialReversalAdjusted` so the
/// degenerate case is surfaced, never silently absorbed. The ledger entry
/// negates the original `credit_delta`, so an apply/reverse round-trip
/// restores periods and balance bit-for-bit.
pub fn plan_reversal(
    periods: &[BillingPeriod],
    allocation: &AllocationResult,
) -> Result<ReversalPlan> {
    let mut subtractions = Vec::new();
    let mut redirected = Money::ZERO;

    for application in allocation.periods() {
        let period = periods
            .iter()
            .find(|p| p.index == application.period)
            .ok_or_else(|| LedgerError::StorageFailure {
                message: format!(
                    "allocation references missing period {}",
                    application.period
                ),
            })?;

        let subtractable = application.amount.min(period.amount_paid).max(Money::ZERO);
        if subtractable.is_positive() {
            subtractions.push(PeriodApplication {
                period: application.period,
                amount: subtractable,
            });
        }
        redirected += application.amount - subtractable;
    }

    let ledger_delta = -allocation.credit_delta() + redirected;
    let outcome = if redirected.is_positive() {
        ReversalOutcome::PartialReversalAdjusted { redirected }
    } else {
        ReversalOutcome::Clean
    };

    Ok(ReversalPlan {
        subtractions,
        ledger_delta,
        redirected,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::plan_allocation;

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

    fn allocate_and_apply(
        ps: &mut Vec<BillingPeriod>,
        credit: Money,
        amount: Money,
    ) -> AllocationResult {
        let plan = plan_allocation(ps, credit, amount).unwrap();
        for a in &plan.applications {
            ps.iter_mut()
                .find(|p| p.index == a.period)
                .unwrap()
                .amount_paid += a.amount;
        }
        plan.into_result().unwrap()
    }

    #[test]
    fn test_round_trip_restores_periods_exactly() {
        let mut ps = periods(&[0, 400, 0]);
        let before = ps.clone();

        let allocation =
            allocate_and_apply(&mut ps, Money::ZERO, Money::from_minor(1800));
        let plan = plan_reversal(&ps, &allocation).unwrap();

        assert_eq!(plan.outcome, ReversalOutcome::Clean);
        for s in &plan.subtractions {
            ps.iter_mut()
                .find(|p| p.index == s.period)
                .unwrap()
                .amount_paid -= s.amount;
        }
        assert_eq!(ps, before);
    }

    #[test]
    fn test_negates_overpayment_credit() {
        // payment over-funds the year: +500 credit, reversal entry is -500
        let mut ps = periods(&[1000, 1000, 0]);
        let allocation =
            allocate_and_apply(&mut ps, Money::ZERO, Money::from_minor(1500));
        assert_eq!(allocation.credit_delta(), Money::from_minor(500));

        let plan = plan_reversal(&ps, &allocation).unwrap();
        assert_eq!(plan.ledger_delta, Money::from_minor(-500));
        assert_eq!(plan.outcome, ReversalOutcome::Clean);
    }

    #[test]
    fn test_negates_credit_draw_down() {
        // payment drew 300 of existing credit: reversal entry is +300
        let mut ps = periods(&[0, 1000, 1000]);
        let allocation =
            allocate_and_apply(&mut ps, Money::from_minor(300), Money::from_minor(700));
        assert_eq!(allocation.credit_delta(), Money::from_minor(-300));

        let plan = plan_reversal(&ps, &allocation).unwrap();
        assert_eq!(plan.ledger_delta, Money::from_minor(300));
    }

    #[test]
    fn test_pure_credit_payment_reverses_to_single_entry() {
        let mut ps = periods(&[1000, 1000, 1000]);
        let allocation =
            allocate_and_apply(&mut ps, Money::ZERO, Money::from_minor(900));

        let plan = plan_reversal(&ps, &allocation).unwrap();
        assert!(plan.subtractions.is_empty());
        assert_eq!(plan.ledger_delta, Money::from_minor(-900));
    }

    #[test]
    fn test_clamp_redirects_excess_and_flags() {
        let mut ps = periods(&[0, 0, 0]);
        let allocation =
            allocate_and_apply(&mut ps, Money::ZERO, Money::from_minor(1000));

        // a later manual edit drained period 1 below the applied amount
        ps[0].amount_paid = Money::from_minor(250);

        let plan = plan_reversal(&ps, &allocation).unwrap();
        assert_eq!(
            plan.subtractions,
            vec![PeriodApplication { period: 1, amount: Money::from_minor(250) }]
        );
        assert_eq!(plan.redirected, Money::from_minor(750));
        assert_eq!(plan.ledger_delta, Money::from_minor(750));
        assert_eq!(
            plan.outcome,
            ReversalOutcome::PartialReversalAdjusted {
                redirected: Money::from_minor(750)
            }
        );
    }

    #[test]
    fn test_missing_period_is_a_storage_failure() {
        let ps = periods(&[0]);
        let allocation = AllocationResult::new(
            vec![PeriodApplication { period: 7, amount: Money::from_minor(100) }],
            Money::ZERO,
            Money::ZERO,
        )
        .unwrap();

        assert!(matches!(
            plan_reversal(&ps, &allocation),
            Err(LedgerError::StorageFailure { .. })
        ));
    }
}
