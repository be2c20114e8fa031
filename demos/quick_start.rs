/// quick start - allocate a payment, inspect the summary, reverse it
use dues_allocation::chrono::NaiveDate;
use dues_allocation::{BillingConfig, DuesEngine, Money, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let mut engine = DuesEngine::new();

    // a unit billed 10.00 per month
    let unit_id = engine.register_unit(
        "A-101",
        BillingConfig::monthly(Money::from_minor(1000)),
        &time,
    )?;
    engine.init_year(unit_id, 2024)?;

    // one payment of 25.00 covers two and a half months
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).ok_or("bad date")?;
    let payment = engine.allocate(
        unit_id,
        2024,
        Money::from_minor(2500),
        date,
        "march dues",
        "chk-1001",
        &time,
    )?;

    for application in payment.allocation.periods() {
        println!("period {} <- {}", application.period, application.amount);
    }
    println!("credit delta: {}", payment.allocation.credit_delta());

    let summary = engine.resync(unit_id, 2024);
    println!(
        "paid {} of {}, outstanding {}, status {:?}",
        summary.total_paid, summary.total_due, summary.outstanding, summary.year_status
    );

    // undo it
    engine.reverse(payment.id, &time)?;
    println!("balance after reversal: {}", engine.current_balance(unit_id, 2024));

    Ok(())
}
