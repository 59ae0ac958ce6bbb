use std::fmt::Write;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use custeio_core::costing::{LineStatus, RecipeCost};
use custeio_core::model::{Ingredient, Recipe, SkippedRow};
use custeio_core::parsing::{ParsedQuotations, ParsedRecipes};

/// Format a money amount the Brazilian way: `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Fraction as a percentage with a decimal comma: 0.025 -> `2,5%`.
pub fn format_percent(fraction: Decimal) -> String {
    format!("{}%", format_number(fraction * Decimal::ONE_HUNDRED))
}

/// Plain number with a decimal comma and no trailing zeros.
pub fn format_number(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn format_ingredients(items: &[&Ingredient], last_sync: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();
    let _ = match last_sync {
        Some(at) => writeln!(out, "Last price check: {}\n", at.format("%d/%m/%Y %H:%M")),
        None => writeln!(out, "Last price check: never run\n"),
    };

    if items.is_empty() {
        let _ = writeln!(out, "  (no ingredients)");
        return out;
    }

    let width = items.iter().map(|i| i.name.chars().count()).max().unwrap_or(10);
    for item in items {
        let _ = writeln!(
            out,
            "  {:<width$}  {:<6}  {:>14}  {}",
            item.name,
            item.unit,
            format_brl(item.unit_price),
            format_date(item.quotation_date),
            width = width
        );
    }
    let _ = writeln!(out, "\n  {} ingredient(s)", items.len());
    out
}

pub fn format_recipes(recipes: &[Recipe]) -> String {
    let mut out = String::new();
    if recipes.is_empty() {
        let _ = writeln!(out, "  (no recipes)");
        return out;
    }

    for recipe in recipes {
        let _ = writeln!(
            out,
            "=== {} ({}) ===",
            recipe.name, recipe.key
        );
        let _ = writeln!(
            out,
            "  Yield: {} kg / {} un, wastage {}",
            format_number(recipe.yield_kg),
            format_number(recipe.yield_units),
            format_percent(recipe.wastage)
        );
        for item in &recipe.line_items {
            let _ = writeln!(out, "  - {} x {}", format_number(item.quantity), item.name);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn format_cost(cost: &RecipeCost) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===\n", cost.recipe_name);

    let width = cost
        .lines
        .iter()
        .map(|l| l.name.chars().count())
        .max()
        .unwrap_or(10);
    for line in &cost.lines {
        let marker = match line.status {
            LineStatus::Priced => "",
            LineStatus::NotFound => "  (not found)",
            LineStatus::Overflow => "  (overflow, not counted)",
        };
        let _ = writeln!(
            out,
            "  {:<width$}  {:>8} {:<4} x {:>12} = {:>12}{}",
            line.name,
            format_number(line.quantity),
            line.unit,
            format_brl(line.unit_price),
            format_brl(line.line_cost),
            marker,
            width = width
        );
    }

    let _ = writeln!(out, "\n  Total: {}", format_brl(cost.total_ingredient_cost));
    let _ = writeln!(out, "  Wastage: {}", format_percent(cost.wastage));
    if let Some(per_kg) = cost.cost_per_kg {
        let _ = writeln!(out, "  Per kg: {}", format_brl(per_kg));
    }
    if let Some(per_unit) = cost.cost_per_unit {
        let _ = writeln!(out, "  Per unit: {}", format_brl(per_unit));
    }

    let missing = cost.missing_lines().count();
    if missing > 0 {
        let _ = writeln!(out, "\n  {missing} ingredient(s) without a price");
    }
    let overflowed = cost.overflowed_lines().count();
    if overflowed > 0 {
        let _ = writeln!(out, "  {overflowed} line(s) too large to add to the total");
    }
    out
}

pub fn format_parsed_quotations(parsed: &ParsedQuotations) -> String {
    let items: Vec<&Ingredient> = parsed.ingredients.iter().collect();
    let mut out = String::new();
    let width = items.iter().map(|i| i.name.chars().count()).max().unwrap_or(10);
    for item in &items {
        let _ = writeln!(
            out,
            "  {:<width$}  {:<6}  {:>14}  {}",
            item.name,
            item.unit,
            format_brl(item.unit_price),
            format_date(item.quotation_date),
            width = width
        );
    }
    let _ = writeln!(out, "\n  {} ingredient(s)", items.len());
    push_skipped(&mut out, &parsed.skipped_rows);
    out
}

pub fn format_parsed_recipes(parsed: &ParsedRecipes) -> String {
    let mut out = format_recipes(&parsed.recipes);
    if !parsed.empty_recipes.is_empty() {
        let _ = writeln!(
            out,
            "  Without line items (not imported): {}",
            parsed.empty_recipes.join(", ")
        );
    }
    push_skipped(&mut out, &parsed.skipped_rows);
    out
}

fn push_skipped(out: &mut String, skipped: &[SkippedRow]) {
    if skipped.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n  Skipped rows:");
    for row in skipped {
        let _ = writeln!(out, "    row {}: {}", row.row_number, row.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custeio_core::costing::LineCost;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_brl_grouping() {
        assert_eq!(format_brl(d("1234.56")), "R$ 1.234,56");
        assert_eq!(format_brl(d("1234567.8")), "R$ 1.234.567,80");
        assert_eq!(format_brl(d("0")), "R$ 0,00");
        assert_eq!(format_brl(d("999.999")), "R$ 1.000,00");
        assert_eq!(format_brl(d("-12.5")), "-R$ 12,50");
    }

    #[test]
    fn test_percent_and_number() {
        assert_eq!(format_percent(d("0.05")), "5%");
        assert_eq!(format_percent(d("0.025")), "2,5%");
        assert_eq!(format_number(d("1.50")), "1,5");
    }

    #[test]
    fn test_cost_lists_missing() {
        let cost = RecipeCost {
            recipe_key: "bolo".into(),
            recipe_name: "Bolo".into(),
            lines: vec![LineCost {
                ingredient_key: "fermento".into(),
                name: "Fermento".into(),
                quantity: d("1"),
                unit: String::new(),
                unit_price: Decimal::ZERO,
                line_cost: Decimal::ZERO,
                status: LineStatus::NotFound,
            }],
            total_ingredient_cost: Decimal::ZERO,
            wastage: Decimal::ZERO,
            cost_per_kg: None,
            cost_per_unit: None,
        };
        let text = format_cost(&cost);
        assert!(text.contains("(not found)"));
        assert!(text.contains("1 ingredient(s) without a price"));
        assert!(!text.contains("Per kg"));
    }

    #[test]
    fn test_ingredients_never_synced() {
        let text = format_ingredients(&[], None);
        assert!(text.contains("never run"));
        assert!(text.contains("(no ingredients)"));
    }
}
