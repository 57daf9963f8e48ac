use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

/// The full ordered product collection. Insertion order is the order every
/// reader sees.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Index of the first record carrying `product_id`.
    pub fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.products.iter().position(|product| product.matches(product_id))
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.matches(product_id))
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.position(product_id).is_some()
    }

    pub fn push(&mut self, product: Product) {
        self.products.push(product);
    }

    pub fn get(&self, index: usize) -> Option<&Product> {
        self.products.get(index)
    }

    /// Swaps the record at `index` for `product`, returning the previous one.
    pub fn replace_at(&mut self, index: usize, product: Product) -> Option<Product> {
        let slot = self.products.get_mut(index)?;
        Some(std::mem::replace(slot, product))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Product> {
        (index < self.products.len()).then(|| self.products.remove(index))
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self { products: iter.into_iter().collect() }
    }
}
