//! Order submission and order history.

use thiserror::Error;
use tracing::{info, instrument};

use phoneplace_core::{Order, OrderLine, ShippingDetails};

use crate::api::{ApiClient, ApiError, NewOrder};
use crate::cart::CartStore;
use crate::session::SessionStore;
use crate::validation::{self, ValidationError};

/// Errors that can occur at checkout or when listing orders.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("sign in to place and view orders")]
    NotSignedIn,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order service error: {0}")]
    Api(#[from] ApiError),
}

/// Places orders for the signed-in identity.
#[derive(Debug, Clone)]
pub struct Checkout {
    api: ApiClient,
}

impl Checkout {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Submit the cart as an order.
    ///
    /// The cart is cleared only once the order service has accepted the
    /// order; on any error it is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn` or `CheckoutError::Validation`
    /// before any request, or the order service failure.
    #[instrument(skip_all, fields(lines = cart.cart().len()))]
    pub async fn submit(
        &self,
        cart: &mut CartStore,
        session: &SessionStore,
        shipping: &ShippingDetails,
    ) -> Result<Order, CheckoutError> {
        let identity = session.identity().ok_or(CheckoutError::NotSignedIn)?;
        if cart.cart().is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let shipping_details = validate_shipping(shipping)?;

        let items: Vec<OrderLine> = cart
            .cart()
            .lines()
            .iter()
            .map(|line| OrderLine {
                id: line.product().id.clone(),
                name: line.product().name.clone(),
                price: line.product().price,
                quantity: line.quantity(),
                images: line.product().images.clone(),
            })
            .collect();

        let order = NewOrder {
            items,
            shipping_details,
            user_email: identity.email.clone(),
            total: cart.total(),
        };

        let placed = self.api.create_order(&order).await?;
        info!(order_id = %placed.id, total = %placed.total, "Order placed");
        cart.clear();
        Ok(placed)
    }

    /// Orders filed under the signed-in identity's email.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotSignedIn` before any request, or the order
    /// service failure.
    pub async fn my_orders(&self, session: &SessionStore) -> Result<Vec<Order>, CheckoutError> {
        let identity = session.identity().ok_or(CheckoutError::NotSignedIn)?;
        Ok(self.api.orders_for(&identity.email).await?)
    }
}

/// Trimmed shipping details; all fields required, email well-formed.
///
/// # Errors
///
/// Returns the first invalid field.
pub fn validate_shipping(shipping: &ShippingDetails) -> Result<ShippingDetails, ValidationError> {
    let name = validation::required("Name", &shipping.name)?;
    let email = validation::email(&shipping.email)?;
    let address = validation::required("Address", &shipping.address)?;
    Ok(ShippingDetails {
        name,
        email: email.into_inner(),
        address,
    })
}
