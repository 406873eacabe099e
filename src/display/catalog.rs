//! Category and product display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Category, CategoryId, Product};

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Min")]
    min_stock: i64,
}

/// Format categories with the number of products in each
pub fn format_category_list(categories: &[Category], products: &[Product]) -> String {
    if categories.is_empty() {
        return "No categories found.".to_string();
    }

    let width = categories.iter().map(|c| c.name.len()).max().unwrap_or(8).max(8);

    let mut output = format!("{:<width$}  {:>8}\n", "Category", "Products", width = width);
    for category in categories {
        let count = products
            .iter()
            .filter(|p| p.category_id == Some(category.id))
            .count();
        output.push_str(&format!("{:<width$}  {:>8}\n", category.name, count, width = width));
    }

    output
}

/// Format products as a table
pub fn format_product_list(products: &[Product], category_names: &HashMap<CategoryId, String>) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }

    let rows = products.iter().map(|p| ProductRow {
        name: p.name.clone(),
        sku: p.sku.clone(),
        category: p
            .category_id
            .and_then(|id| category_names.get(&id).cloned())
            .unwrap_or_default(),
        cost: p.purchase_price.to_string(),
        price: p.selling_price.to_string(),
        min_stock: p.min_stock,
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Format a single product's details
pub fn format_product_details(product: &Product, category: Option<&str>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Product: {}\n", product.name));
    output.push_str(&format!("  ID:             {}\n", product.id));
    if !product.sku.is_empty() {
        output.push_str(&format!("  SKU:            {}\n", product.sku));
    }
    output.push_str(&format!("  Category:       {}\n", category.unwrap_or("-")));
    output.push_str(&format!("  Purchase price: {}\n", product.purchase_price));
    output.push_str(&format!("  Selling price:  {}\n", product.selling_price));
    output.push_str(&format!("  Unit margin:    {}\n", product.unit_margin()));
    output.push_str(&format!("  Min stock:      {}\n", product.min_stock));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_category_counts() {
        let food = Category::new("Food");
        let mut rice = Product::new("Rice", Money::from_cents(100), Money::from_cents(150));
        rice.category_id = Some(food.id);

        let output = format_category_list(&[food], &[rice]);
        assert!(output.contains("Food"));
        assert!(output.trim_end().ends_with('1'));
    }

    #[test]
    fn test_product_list_and_details() {
        let mut soap = Product::new("Soap", Money::from_cents(120), Money::from_cents(200));
        soap.sku = "SP-1".into();

        let table = format_product_list(std::slice::from_ref(&soap), &HashMap::new());
        assert!(table.contains("SP-1"));
        assert!(table.contains("$2.00"));

        let details = format_product_details(&soap, Some("Household"));
        assert!(details.contains("Unit margin:    $0.80"));
        assert!(details.contains("Household"));
    }
}
