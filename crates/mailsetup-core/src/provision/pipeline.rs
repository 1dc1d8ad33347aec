//! Request orchestration.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use super::outcome::{FailureReason, ProvisioningResult, Stage};
use super::request::ProvisioningRequest;
use super::validation::{AddressValidator, BasicAddressValidator, validate};
use crate::account::{AccountStore, Direction, HostAuthBuilder, persist};
use crate::config::ProvisioningConfig;
use crate::identity::{IdentityRegistrar, RegistrarAdapter};
use crate::provider::{ProviderDirectory, ProviderResolver};
use crate::report::{Delivery, ResultReporter};

/// Runs provisioning requests through every stage in order.
///
/// Stages after the first failure never run. Every request yields exactly
/// one reported result.
pub struct Pipeline<S> {
    config: ProvisioningConfig,
    validator: Arc<dyn AddressValidator>,
    resolver: ProviderResolver,
    host_auth: HostAuthBuilder,
    store: S,
    registrar: RegistrarAdapter,
    reporter: ResultReporter,
}

impl<S: AccountStore> Pipeline<S> {
    /// Assembles a pipeline from its collaborators.
    ///
    /// Addresses are checked with [`BasicAddressValidator`] unless replaced
    /// with [`Pipeline::with_validator`].
    #[must_use]
    pub fn new(
        config: ProvisioningConfig,
        directory: Arc<dyn ProviderDirectory>,
        store: S,
        registrar: Arc<dyn IdentityRegistrar>,
    ) -> Self {
        Self {
            validator: Arc::new(BasicAddressValidator),
            resolver: ProviderResolver::new(directory),
            host_auth: HostAuthBuilder::new(config.host_auth_flags),
            store,
            registrar: RegistrarAdapter::new(registrar, config.registrar_timeout),
            reporter: ResultReporter::new(config.broadcast_capacity),
            config,
        }
    }

    /// Replaces the address validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn AddressValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    /// The account store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The reporter results are dispatched through.
    #[must_use]
    pub const fn reporter(&self) -> &ResultReporter {
        &self.reporter
    }

    /// Listens to broadcast results.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningResult> {
        self.reporter.subscribe()
    }

    /// Provisions one account and reports the outcome.
    #[instrument(
        skip(self, request),
        fields(
            email = request.email.as_deref().unwrap_or_default(),
            caller = request.caller.as_deref().unwrap_or("unknown"),
        )
    )]
    pub async fn run(&self, request: ProvisioningRequest) -> ProvisioningResult {
        let result = self.execute(&request).await;

        match self.reporter.report(&result, &request.reply) {
            Delivery::Broadcast { listeners } => {
                debug!("Result broadcast to {listeners} listener(s)");
            }
            Delivery::Targeted => debug!("Result delivered to caller"),
        }
        result
    }

    async fn execute(&self, request: &ProvisioningRequest) -> ProvisioningResult {
        let email = request.email.as_deref().map(str::trim).unwrap_or_default();
        let failure = |stage: Stage, reason: FailureReason| {
            warn!("Provisioning failed while {stage}: {}", reason.code());
            ProvisioningResult::failure(email, request.version.as_str(), stage, reason)
        };

        debug!("Stage {}", Stage::Validating);
        let credentials =
            match validate(request, self.validator.as_ref(), &self.config.supported_version) {
                Ok(credentials) => credentials,
                Err(reason) => return failure(Stage::Validating, reason),
            };

        debug!("Stage {}", Stage::ResolvingProvider);
        let provider = match self.resolver.resolve(credentials.email) {
            Ok(provider) => provider,
            Err(reason) => return failure(Stage::ResolvingProvider, reason),
        };

        debug!("Stage {}", Stage::BuildingInboundAuth);
        let incoming = match self.host_auth.build(
            Direction::Incoming,
            request,
            &credentials,
            provider.as_ref(),
        ) {
            Ok(descriptor) => descriptor,
            Err(reason) => return failure(Stage::BuildingInboundAuth, reason),
        };

        debug!("Stage {}", Stage::BuildingOutboundAuth);
        let outgoing = match self.host_auth.build(
            Direction::Outgoing,
            request,
            &credentials,
            provider.as_ref(),
        ) {
            Ok(descriptor) => descriptor,
            Err(reason) => return failure(Stage::BuildingOutboundAuth, reason),
        };

        debug!("Stage {}", Stage::Persisting);
        let id = match persist(
            &self.store,
            request.display_name_or_email(),
            credentials.email,
            incoming,
            outgoing,
        )
        .await
        {
            Ok(id) => id,
            Err(reason) => return failure(Stage::Persisting, reason),
        };

        // The stored account stays in place if registration fails.
        debug!("Stage {}", Stage::RegisteringIdentity);
        if !self
            .registrar
            .register(credentials.email, credentials.password, request.sync)
            .await
        {
            return failure(Stage::RegisteringIdentity, FailureReason::Unknown)
                .with_account_id(Some(id));
        }

        info!("Provisioned {} as account {id}", credentials.email);
        ProvisioningResult::success(email, request.version.as_str(), id)
    }
}

impl<S> std::fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("host_auth", &self.host_auth)
            .field("registrar", &self.registrar)
            .finish_non_exhaustive()
    }
}
