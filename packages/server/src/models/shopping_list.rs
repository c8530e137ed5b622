use std::collections::BTreeMap;
use std::fmt::Write;

/// One ingredient requirement of one recipe in the cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Total amount of one ingredient across the whole cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sum amounts per `(name, unit)`.
///
/// The result is sorted by name, then unit, so it does not depend on the
/// order the cart lines arrive in.
pub fn aggregate<I>(lines: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_default() += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Render the list as a plain-text file, one item per line.
pub fn render_text(items: &[ShoppingListItem]) -> String {
    let mut out = String::from("Shopping list\n\n");
    if items.is_empty() {
        out.push_str("(empty)\n");
    }
    for item in items {
        let _ = writeln!(
            out,
            "{} ({}) — {}",
            item.name, item.measurement_unit, item.amount
        );
    }
    out
}
