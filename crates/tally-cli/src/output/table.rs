use rust_decimal::Decimal;
use tally_core::model::{Direction, Statement};
use tally_core::ParsedStatement;

const DESCRIPTION_WIDTH: usize = 40;

pub fn print(parsed: &ParsedStatement) {
    let statement = &parsed.statement;

    print_header(statement);
    println!("  Source: {}\n", parsed.source);

    if !statement.transactions.is_empty() {
        let max_category = statement
            .transactions
            .iter()
            .map(|t| t.category.len())
            .max()
            .unwrap_or(10);

        println!(
            "  {:<10}  {:<desc$}  {:>14}  {:<cat$}  {:>14}",
            "Date",
            "Description",
            "Amount",
            "Category",
            "Balance",
            desc = DESCRIPTION_WIDTH,
            cat = max_category
        );
        println!(
            "  {}",
            "-".repeat(10 + DESCRIPTION_WIDTH + max_category + 14 * 2 + 8)
        );

        for t in &statement.transactions {
            let balance = t.balance.map(money).unwrap_or_default();
            println!(
                "  {:<10}  {:<desc$}  {:>14}  {:<cat$}  {:>14}",
                t.date.to_string(),
                truncate(&t.description, DESCRIPTION_WIDTH),
                money(t.signed_amount()),
                t.category,
                balance,
                desc = DESCRIPTION_WIDTH,
                cat = max_category
            );
        }
        println!();
    }

    println!("  Total income:   {:>14}", money(statement.total_income));
    println!("  Total expense:  {:>14}", money(statement.total_expense));
    println!("  Balance:        {:>14}", money(statement.balance));

    let breakdown = statement.category_breakdown();
    if !breakdown.is_empty() {
        println!("\n  Spending by category:");
        for total in &breakdown {
            println!(
                "    {:<24} {:>14}  ({} transaction{})",
                total.category,
                money(total.amount),
                total.count,
                if total.count == 1 { "" } else { "s" }
            );
        }
    }

    let credits = count(statement, Direction::Credit);
    let debits = count(statement, Direction::Debit);
    if credits + debits > 0 {
        println!("\n  {credits} credit(s), {debits} debit(s)");
    }
}

fn print_header(statement: &Statement) {
    let mut printed = false;
    if let Some(ref name) = statement.account_name {
        println!("  Account:  {name}");
        printed = true;
    }
    if let Some(ref number) = statement.account_number {
        println!("  Number:   {number}");
        printed = true;
    }
    if let Some(ref period) = statement.period {
        println!("  Period:   {} to {}", period.start, period.end);
        printed = true;
    }
    if printed {
        println!();
    }
}

fn count(statement: &Statement, direction: Direction) -> usize {
    statement
        .transactions
        .iter()
        .filter(|t| t.direction == direction)
        .count()
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('~');
    cut
}
