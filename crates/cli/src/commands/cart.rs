//! Cart commands.

use clap::Subcommand;

use phoneplace_core::ProductId;

use super::Context;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Set a product's quantity; zero or less removes it
    Set {
        /// Product ID
        id: String,

        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
}

pub async fn run(
    ctx: &mut Context,
    action: Option<CartAction>,
) -> Result<(), Box<dyn std::error::Error>> {
    match action.unwrap_or(CartAction::Show) {
        CartAction::Show => {}
        CartAction::Add { id, quantity } => {
            let product = ctx.api.fetch_product(&ProductId::new(id)).await?;
            ctx.cart.add_item(&product, quantity)?;
            ctx.save_cart()?;
        }
        CartAction::Remove { id } => {
            ctx.cart.remove_item(&ProductId::new(id));
            ctx.save_cart()?;
        }
        CartAction::Set { id, quantity } => {
            ctx.cart.set_quantity(&ProductId::new(id), quantity);
            ctx.save_cart()?;
        }
        CartAction::Clear => {
            ctx.cart.clear();
            ctx.save_cart()?;
        }
    }
    show(ctx);
    Ok(())
}

fn show(ctx: &Context) {
    let cart = ctx.cart.cart();
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<26} {:<36} {:>4} × {:>16} = {:>16}",
            line.product().id.as_str(),
            line.product().name,
            line.quantity(),
            line.product().price.display(),
            line.line_total().display(),
        );
    }
    println!(
        "{} item(s), total {}",
        ctx.cart.item_count(),
        ctx.cart.total().display()
    );
}
