//! Session commands.

use clap::Args;

use phoneplace_client::auth::{
    AuthError, AuthService, Authenticator, DemoAuthenticator, Fallback, LoginForm,
    RemoteAuthenticator, SignupForm,
};
use phoneplace_core::Identity;

use super::Context;

/// Fields of `pp-cli signup`.
#[derive(Args)]
pub struct SignupArgs {
    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    #[arg(short, long)]
    email: String,

    #[arg(long)]
    phone: Option<String>,

    #[arg(short, long)]
    password: String,

    /// Repeat the password
    #[arg(long)]
    confirm_password: String,

    /// Accept the terms and conditions
    #[arg(long)]
    accept_terms: bool,
}

enum Request {
    Login(LoginForm),
    Signup(SignupForm),
}

async fn authenticate<A: Authenticator>(
    authenticator: A,
    ctx: &mut Context,
    request: &Request,
) -> Result<Identity, AuthError> {
    let service = AuthService::new(authenticator);
    match request {
        Request::Login(form) => service.login(&mut ctx.session, form).await,
        Request::Signup(form) => service.signup(&mut ctx.session, form).await,
    }
}

/// Use the auth endpoints, falling back to the demo accounts when enabled.
async fn dispatch(ctx: &mut Context, request: &Request) -> Result<Identity, AuthError> {
    let remote = RemoteAuthenticator::new(ctx.api.clone());
    if ctx.config.demo_accounts {
        authenticate(Fallback::new(remote, DemoAuthenticator::new()), ctx, request).await
    } else {
        authenticate(remote, ctx, request).await
    }
}

pub async fn login(
    ctx: &mut Context,
    email: String,
    password: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = dispatch(ctx, &Request::Login(LoginForm { email, password })).await?;
    println!("Signed in as {} ({})", identity.display_name(), identity.role);
    Ok(())
}

pub async fn signup(ctx: &mut Context, args: SignupArgs) -> Result<(), Box<dyn std::error::Error>> {
    let form = SignupForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        password: args.password,
        confirm_password: args.confirm_password,
        accept_terms: args.accept_terms,
    };
    let identity = dispatch(ctx, &Request::Signup(form)).await?;
    println!("Welcome, {}", identity.display_name());
    Ok(())
}

pub fn logout(ctx: &mut Context) -> Result<(), Box<dyn std::error::Error>> {
    let was_signed_in = ctx.session.is_authenticated();
    ctx.session.logout()?;
    if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub fn whoami(ctx: &Context) {
    match ctx.session.identity() {
        Some(identity) => {
            println!("{}", identity.display_name());
            println!("email: {}", identity.email);
            if let Some(phone) = &identity.phone {
                println!("phone: {phone}");
            }
            println!("role:  {}", identity.role);
        }
        None => println!("Not signed in"),
    }
}
