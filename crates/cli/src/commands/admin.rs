//! Catalog management commands (admin accounts only).
//!
//! # Usage
//!
//! ```bash
//! pp-cli admin create --name "Galaxy A55" --brand Samsung --category Phone \
//!     --price 45999 --description "6.6\" AMOLED" --image https://img.example.com/a55.jpg
//!
//! pp-cli admin update 65f1c0ffee --price 42999 --out-of-stock
//! pp-cli admin delete 65f1c0ffee
//! ```

use clap::{Args, Subcommand};

use phoneplace_client::admin::AdminCatalog;
use phoneplace_client::api::ProductDraft;
use phoneplace_core::{Category, Price, ProductId};

use super::{Context, product_line};

#[derive(Subcommand)]
pub enum AdminAction {
    /// Create a product
    Create(CreateArgs),
    /// Change fields of an existing product
    Update {
        /// Product ID
        id: String,

        #[command(flatten)]
        changes: UpdateArgs,
    },
    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    brand: String,

    /// Phone or Accessory
    #[arg(long)]
    category: Category,

    /// Price in KES (e.g. 45999 or 45999.50)
    #[arg(long)]
    price: String,

    #[arg(long)]
    description: String,

    /// Image URL; repeat for more
    #[arg(long = "image", required = true)]
    images: Vec<String>,

    #[arg(long)]
    out_of_stock: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    brand: Option<String>,

    #[arg(long)]
    category: Option<Category>,

    /// Price in KES
    #[arg(long)]
    price: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Replace all images; repeat for more
    #[arg(long = "image")]
    images: Vec<String>,

    #[arg(long, conflicts_with = "out_of_stock")]
    in_stock: bool,

    #[arg(long)]
    out_of_stock: bool,
}

impl UpdateArgs {
    fn apply(self, draft: &mut ProductDraft) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(brand) = self.brand {
            draft.brand = brand;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(price) = self.price {
            draft.price = Price::parse_major(&price)?;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if !self.images.is_empty() {
            draft.images = self.images;
        }
        if self.in_stock {
            draft.in_stock = true;
        }
        if self.out_of_stock {
            draft.in_stock = false;
        }
        Ok(())
    }
}

pub async fn run(ctx: &Context, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = AdminCatalog::new(ctx.api.clone());

    match action {
        AdminAction::Create(args) => {
            let draft = ProductDraft {
                name: args.name,
                brand: args.brand,
                category: args.category,
                price: Price::parse_major(&args.price)?,
                description: args.description,
                images: args.images,
                specs: None,
                in_stock: !args.out_of_stock,
            };
            let product = catalog.create(&ctx.session, &draft).await?;
            println!("Created {}", product_line(&product));
        }
        AdminAction::Update { id, changes } => {
            let id = ProductId::new(id);
            let current = ctx.api.get_product(&id).await?;
            let mut draft = ProductDraft::from_product(&current);
            changes.apply(&mut draft)?;
            let product = catalog.update(&ctx.session, &id, &draft).await?;
            println!("Updated {}", product_line(&product));
        }
        AdminAction::Delete { id } => {
            let id = ProductId::new(id);
            catalog.delete(&ctx.session, &id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
