//! Catalog browsing commands.

use clap::Args;

use phoneplace_client::catalog::CatalogBrowser;
use phoneplace_client::loadable::Loadable;
use phoneplace_core::{FilterKey, Price, ProductFilter, ProductId};

use super::{Context, product_line};

/// Filters for `pp-cli products`.
#[derive(Args)]
pub struct ProductsArgs {
    #[arg(long)]
    brand: Option<String>,

    /// Phone or Accessory
    #[arg(long)]
    category: Option<String>,

    /// Only products in stock
    #[arg(long)]
    in_stock: bool,

    /// Minimum price in KES (e.g. 15000 or 15000.50)
    #[arg(long)]
    min_price: Option<String>,

    /// Maximum price in KES
    #[arg(long)]
    max_price: Option<String>,

    /// Any other filter as KEY=VALUE (e.g. `price_tier=flagship`)
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
}

impl ProductsArgs {
    fn to_filter(&self) -> Result<ProductFilter, Box<dyn std::error::Error>> {
        let mut filter = ProductFilter::new();
        if let Some(brand) = &self.brand {
            filter.set(FilterKey::Brand, brand.as_str());
        }
        if let Some(category) = &self.category {
            filter.set(FilterKey::Category, category.as_str());
        }
        if self.in_stock {
            filter.set(FilterKey::InStock, true);
        }
        if let Some(min) = &self.min_price {
            filter.set(FilterKey::MinPrice, Price::parse_major(min)?.minor());
        }
        if let Some(max) = &self.max_price {
            filter.set(FilterKey::MaxPrice, Price::parse_major(max)?.minor());
        }
        for pair in &self.filters {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("expected KEY=VALUE, got {pair:?}"))?;
            filter.set(key.trim().parse::<FilterKey>()?, value.trim());
        }
        Ok(filter)
    }
}

pub async fn health(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let health = ctx.api.health().await?;
    println!("{} ({})", health.status, ctx.api.base_url());
    if let Some(database) = &health.database {
        println!("database: {database}");
    }
    if let Some(message) = &health.message {
        println!("{message}");
    }
    if !health.is_healthy() {
        return Err("catalog service is not healthy".into());
    }
    Ok(())
}

pub async fn products(ctx: &Context, args: ProductsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut browser = CatalogBrowser::new(ctx.api.clone());
    browser.set_filter(args.to_filter()?);
    browser.refresh().await;

    match browser.products() {
        Loadable::Ready(_) => {
            let visible = browser.visible_products();
            for product in &visible {
                println!("{}", product_line(product));
            }
            println!("{} product(s)", visible.len());
            Ok(())
        }
        Loadable::Failed(message) => Err(message.clone().into()),
        Loadable::Loading => Ok(()),
    }
}

pub async fn product(ctx: &Context, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let product = ctx.api.get_product(&ProductId::new(id)).await?;

    println!("{} ({})", product.name, product.id);
    println!("{} · {}", product.brand, product.category);
    println!("{}", product.price.display());
    match (product.in_stock, product.stock_quantity) {
        (true, Some(quantity)) => println!("In stock: {quantity}"),
        (true, None) => println!("In stock"),
        (false, _) => println!("Out of stock"),
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    if let Some(specs) = &product.specs {
        println!();
        for (key, value) in specs.entries() {
            println!("  {key}: {value}");
        }
    }
    for image in &product.images {
        println!("  image: {image}");
    }
    Ok(())
}

pub async fn filters(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut browser = CatalogBrowser::new(ctx.api.clone());
    browser.load_filter_options().await;

    let options = match browser.filter_options() {
        Loadable::Ready(options) => options,
        Loadable::Failed(message) => return Err(message.clone().into()),
        Loadable::Loading => return Ok(()),
    };

    for key in FilterKey::ALL {
        let choices = options.choices(key);
        if !choices.is_empty() {
            println!("{key}: {}", choices.join(", "));
        }
    }
    println!(
        "price: {} - {}",
        Price::from_minor(options.price_range.min).display(),
        Price::from_minor(options.price_range.max).display()
    );
    Ok(())
}
