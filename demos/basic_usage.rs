// ============================================================================
// Basic Usage Example
// ============================================================================

use finance_engine::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "logging")]
    finance_engine::utils::init_logging("finance_engine=debug")?;

    println!("=== Financial Engine Example ===\n");

    let engine = FinancialEngineBuilder::new().build()?;
    let status = engine.initialize().await;
    println!(
        "Backend: {:?} ({}) resolved in {:?}",
        status.kind, status.kernel, status.load_time
    );
    if let Some(reason) = &status.fallback_reason {
        println!("Fallback reason: {}", reason);
    }

    // Time value of money
    println!("\n=== Time Value of Money ===");
    let amount = engine.compound_interest(10_000.0, 0.07, 12, 10).await?;
    println!("10,000 at 7% compounded monthly for 10 years: {:.2}", amount);

    let pv = engine.present_value(1_000.0, 0.05, 10).await?;
    println!("Present value of 1,000 in 10 years at 5%: {:.2}", pv);

    let growth = engine.investment_growth(5_000.0, 200.0, 0.08, 20).await?;
    println!("5,000 plus 200/month at 8% for 20 years: {:.2}", growth);

    // Loans and mortgages
    println!("\n=== Loans and Mortgages ===");
    let payment = engine.loan_payment(300_000.0, 0.065, 30).await?;
    println!("300,000 loan at 6.5% over 30 years: {:.2}/month", payment);

    let breakdown = engine
        .mortgage_breakdown(400_000.0, 0.065, 30, MortgageOptions::new())
        .await?;
    println!("400,000 mortgage at 6.5% over 30 years:");
    println!("  Principal & interest: {:.2}", breakdown.principal_and_interest);
    println!("  PMI:                  {:.2}", breakdown.pmi);
    println!("  Property tax:         {:.2}", breakdown.property_tax);
    println!("  Total:                {:.2}", breakdown.total);

    let schedule = engine.amortization_schedule(200_000.0, 0.06, 15).await?;
    println!("\nFirst payments of a 200,000 loan at 6% over 15 years:");
    for entry in schedule.iter().take(3) {
        println!(
            "  #{:<3} interest {:>8.2}  principal {:>8.2}  balance {:>10.2}",
            entry.period, entry.interest, entry.principal, entry.balance
        );
    }

    // Portfolio analytics
    println!("\n=== Portfolio Analytics ===");
    let returns = [0.01, 0.02, -0.01, 0.03, 0.015];
    let market = [0.008, 0.015, -0.012, 0.025, 0.01];
    let metrics = engine.portfolio_metrics(&returns, &market, None).await?;
    println!("Average return: {:.4}", metrics.average_return);
    println!("Volatility:     {:.4}", metrics.volatility);
    match metrics.sharpe_ratio {
        Some(sharpe) => println!("Sharpe ratio:   {:.4}", sharpe),
        None => println!("Sharpe ratio:   undefined (zero volatility)"),
    }
    match metrics.beta {
        Some(beta) => println!("Beta:           {:.4}", beta),
        None => println!("Beta:           undefined (flat market)"),
    }

    // Diagnostics
    println!("\n=== Benchmark ===");
    let report = engine.benchmark(1_000, 252).await?;
    println!("Scalar:      {:?}", report.fallback.elapsed);
    if let Some(accelerated) = report.accelerated {
        println!("{:<12} {:?}", format!("{}:", accelerated.kernel), accelerated.elapsed);
    }
    if let Some(speedup) = report.speedup() {
        println!("Speedup:     {:.2}x", speedup);
    }

    Ok(())
}
