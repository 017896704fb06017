//! Checkout and order history commands.

use clap::Args;

use phoneplace_client::checkout::{Checkout, CheckoutError};
use phoneplace_core::ShippingDetails;

use super::Context;

/// Shipping details for `pp-cli checkout`; name and email default to the
/// signed-in account.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    address: String,
}

pub async fn checkout(
    ctx: &mut Context,
    args: CheckoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = ctx.session.identity().ok_or(CheckoutError::NotSignedIn)?;
    let shipping = ShippingDetails {
        name: args.name.unwrap_or_else(|| identity.display_name()),
        email: args.email.unwrap_or_else(|| identity.email.to_string()),
        address: args.address,
    };

    let order = Checkout::new(ctx.api.clone())
        .submit(&mut ctx.cart, &ctx.session, &shipping)
        .await?;
    ctx.save_cart()?;

    println!(
        "Order {} placed: {} item(s), {} ({})",
        order.short_id(),
        order.unit_count(),
        order.total.display(),
        order.status
    );
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let orders = Checkout::new(ctx.api.clone()).my_orders(&ctx.session).await?;
    if orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    for order in &orders {
        println!(
            "{:<8}  {}  {:<10}  {:>3} item(s)  {:>16}",
            order.short_id(),
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.label(),
            order.unit_count(),
            order.total.display(),
        );
    }
    Ok(())
}
