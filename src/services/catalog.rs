//! Catalog service
//!
//! Categories and products. Products reference a category by id; both are
//! looked up by name or id string from the CLI.

use tracing::info;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{Category, CategoryId, Product, ProductId};
use crate::storage::{tables, DataStore, DataStoreExt, Filter};

/// Service for categories and products
pub struct CatalogService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> CatalogService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    // === Categories ===

    pub fn create_category(&self, name: &str) -> BranchbookResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BranchbookError::Validation(
                "Category name cannot be empty".into(),
            ));
        }

        if self.get_category_by_name(name)?.is_some() {
            return Err(BranchbookError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let category = self.store.insert_as(tables::CATEGORIES, &Category::new(name))?;
        info!(category = %category.id, name = %category.name, "created category");
        Ok(category)
    }

    pub fn list_categories(&self) -> BranchbookResult<Vec<Category>> {
        self.store.select_as(tables::CATEGORIES, &[])
    }

    pub fn get_category(&self, id: CategoryId) -> BranchbookResult<Option<Category>> {
        self.store.find_as(tables::CATEGORIES, &[Filter::eq("id", id)])
    }

    pub fn get_category_by_name(&self, name: &str) -> BranchbookResult<Option<Category>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list_categories()?
            .into_iter()
            .find(|c| c.name.to_lowercase() == name))
    }

    /// Find a category by name or ID string
    pub fn find_category(&self, identifier: &str) -> BranchbookResult<Option<Category>> {
        if let Some(category) = self.get_category_by_name(identifier)? {
            return Ok(Some(category));
        }

        if let Ok(id) = identifier.parse::<CategoryId>() {
            return self.get_category(id);
        }

        Ok(None)
    }

    pub fn resolve_category(&self, identifier: &str) -> BranchbookResult<Category> {
        self.find_category(identifier)?
            .ok_or_else(|| BranchbookError::category_not_found(identifier))
    }

    // === Products ===

    /// Add a product to the catalog
    ///
    /// Names and non-empty SKUs must be unique; the category, when given,
    /// must exist.
    pub fn create_product(&self, mut product: Product) -> BranchbookResult<Product> {
        product.name = product.name.trim().to_string();
        product.sku = product.sku.trim().to_string();
        product.validate().map_err(BranchbookError::Validation)?;

        if let Some(category_id) = product.category_id {
            if self.get_category(category_id)?.is_none() {
                return Err(BranchbookError::category_not_found(category_id.to_string()));
            }
        }

        let existing = self.list_products()?;
        let name = product.name.to_lowercase();
        if let Some(dup) = existing.iter().find(|p| {
            p.name.to_lowercase() == name || (!product.sku.is_empty() && p.sku == product.sku)
        }) {
            return Err(BranchbookError::Duplicate {
                entity_type: "Product",
                identifier: dup.to_string(),
            });
        }

        let product = self.store.insert_as(tables::PRODUCTS, &product)?;
        info!(product = %product.id, name = %product.name, "created product");
        Ok(product)
    }

    pub fn list_products(&self) -> BranchbookResult<Vec<Product>> {
        self.store.select_as(tables::PRODUCTS, &[])
    }

    /// Products in one category
    pub fn products_in_category(&self, category_id: CategoryId) -> BranchbookResult<Vec<Product>> {
        self.store
            .select_as(tables::PRODUCTS, &[Filter::eq("category_id", category_id)])
    }

    pub fn get_product(&self, id: ProductId) -> BranchbookResult<Option<Product>> {
        self.store.find_as(tables::PRODUCTS, &[Filter::eq("id", id)])
    }

    /// Find a product by name, SKU or ID string
    pub fn find_product(&self, identifier: &str) -> BranchbookResult<Option<Product>> {
        let needle = identifier.trim().to_lowercase();
        let products = self.list_products()?;

        if let Some(product) = products
            .iter()
            .find(|p| p.name.to_lowercase() == needle || (!p.sku.is_empty() && p.sku.to_lowercase() == needle))
        {
            return Ok(Some(product.clone()));
        }

        if let Ok(id) = identifier.parse::<ProductId>() {
            return Ok(products.into_iter().find(|p| p.id == id));
        }

        Ok(None)
    }

    pub fn resolve_product(&self, identifier: &str) -> BranchbookResult<Product> {
        self.find_product(identifier)?
            .ok_or_else(|| BranchbookError::product_not_found(identifier))
    }
}
