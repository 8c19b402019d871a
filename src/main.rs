use checkout_flow::application::checkout::{CheckoutState, CheckoutStateMachine};
use checkout_flow::application::poller::{DEFAULT_MAX_ATTEMPTS, StatusPoller};
use checkout_flow::config::{CheckoutConfig, DEFAULT_API_BASE_URL};
use checkout_flow::domain::form::{FormField, MethodKind};
use checkout_flow::infrastructure::http::HttpGateway;
use checkout_flow::interfaces::terminal::CheckoutRenderer;
use checkout_flow::logging;
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Pay for an order through the hosted checkout API", long_about = None)]
struct Cli {
    /// Identifier of the order to pay for
    #[arg(long, env = "CHECKOUT_ORDER_ID")]
    order_id: String,

    /// Base URL of the public checkout API
    #[arg(long, env = "CHECKOUT_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// Milliseconds between payment status queries
    #[arg(long, env = "CHECKOUT_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Status queries before giving up on a pending payment
    #[arg(long, env = "CHECKOUT_MAX_POLL_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_poll_attempts: u32,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "CHECKOUT_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// After a failed payment, offer to resubmit the same details
    #[arg(long)]
    interactive: bool,

    /// Log every step to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    method: MethodArgs,
}

#[derive(Subcommand)]
enum MethodArgs {
    /// Pay with a UPI virtual payment address
    Upi {
        #[arg(long)]
        vpa: String,
    },
    /// Pay with a credit or debit card
    Card {
        #[arg(long)]
        number: String,
        /// Expiry as MM/YY
        #[arg(long)]
        expiry: String,
        #[arg(long)]
        cvv: String,
        /// Cardholder name
        #[arg(long)]
        name: String,
    },
}

impl MethodArgs {
    fn fill(&self, session: &mut CheckoutStateMachine) -> checkout_flow::error::Result<()> {
        match self {
            MethodArgs::Upi { vpa } => {
                session.select_method(MethodKind::Upi)?;
                session.enter(FormField::Vpa, vpa.as_str())
            }
            MethodArgs::Card {
                number,
                expiry,
                cvv,
                name,
            } => {
                session.select_method(MethodKind::Card)?;
                session.enter(FormField::CardNumber, number.as_str())?;
                session.enter(FormField::Expiry, expiry.as_str())?;
                session.enter(FormField::Cvv, cvv.as_str())?;
                session.enter(FormField::HolderName, name.as_str())
            }
        }
    }
}

fn confirm_retry() -> io::Result<bool> {
    print!("Try again? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = CheckoutConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        max_poll_attempts: cli.max_poll_attempts,
        request_timeout: Duration::from_secs(cli.timeout_secs),
        ..CheckoutConfig::default()
    }
    .with_api_base_url(cli.api_url.as_str());

    let gateway = HttpGateway::new(&config).into_diagnostic()?;
    let poller = StatusPoller::new(Arc::new(gateway.clone()))
        .with_interval(config.poll_interval)
        .with_max_attempts(config.max_poll_attempts);

    // Nothing is rendered until the order is available.
    let mut session = CheckoutStateMachine::initialize(
        &cli.order_id,
        &gateway,
        Arc::new(gateway.clone()),
        poller,
    )
    .await
    .into_diagnostic()?;

    let stdout = io::stdout();
    let mut renderer = CheckoutRenderer::new(stdout.lock());
    renderer.render_order(session.order()).into_diagnostic()?;

    let succeeded = loop {
        renderer.render_state(session.state()).into_diagnostic()?;
        cli.method.fill(&mut session).into_diagnostic()?;
        let state = session.submit().await.into_diagnostic()?;
        renderer.render_state(state).into_diagnostic()?;
        while let Some(state) = session.next_update().await {
            renderer.render_state(state).into_diagnostic()?;
        }

        match session.state() {
            CheckoutState::Success => break true,
            CheckoutState::Failed(_) if cli.interactive && confirm_retry().into_diagnostic()? => {
                // The form is cleared by retry and refilled from the same arguments.
                session.retry().into_diagnostic()?;
            }
            _ => break false,
        }
    };

    session.close().await;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
