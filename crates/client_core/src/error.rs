use shared::error::GatewayError;
use thiserror::Error;

/// Required field whose absence stopped an operation before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationField {
    Credentials,
    Email,
    Name,
    Description,
    Image,
    Prices,
}

/// Multi-step write that failed after its first step had already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialWriteOperation {
    ProductCreate,
    ProductDelete,
}

/// Client-boundary error taxonomy. Every remote failure is caught at the
/// component boundary and mapped here; `user_message` is the only text that
/// may reach a screen, and it never echoes gateway-internal codes.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("required field missing: {field:?}")]
    Validation { field: ValidationField },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("no profile record for the authenticated identity")]
    ProfileNotFound,
    #[error("sign-in failed")]
    SignInFailed(#[source] GatewayError),
    #[error("credential reset dispatch failed")]
    PasswordResetFailed(#[source] GatewayError),
    #[error("remote query failed")]
    QueryFailed(#[source] GatewayError),
    #[error("product registration failed")]
    CreateProductFailed(#[source] GatewayError),
    #[error("product deletion failed")]
    DeleteProductFailed(#[source] GatewayError),
    #[error("delivery status update failed")]
    DeliveryUpdateFailed(#[source] GatewayError),
    #[error("{operation:?} left an orphaned blob at {orphaned_path}")]
    PartialWrite {
        operation: PartialWriteOperation,
        orphaned_path: String,
        #[source]
        source: GatewayError,
    },
    #[error("local session storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn validation(field: ValidationField) -> Self {
        Self::Validation { field }
    }

    /// Notification text shown to staff. Product language is pt-BR.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation {
                field: ValidationField::Credentials,
            } => "Informe o e-mail e a senha.",
            Self::Validation {
                field: ValidationField::Email,
            } => "Informe o e-mail.",
            Self::Validation {
                field: ValidationField::Name,
            } => "Informe o nome.",
            Self::Validation {
                field: ValidationField::Description,
            } => "Informe a descrição.",
            Self::Validation {
                field: ValidationField::Image,
            } => "Selecione uma imagem.",
            Self::Validation {
                field: ValidationField::Prices,
            } => "Informe o preço de todos os tamanhos.",
            Self::InvalidCredentials => "E-mail e/ou senha inválida.",
            Self::ProfileNotFound => "Não foi possível buscar dados do usuário.",
            Self::SignInFailed(_) => "Não foi possível realizar o login.",
            Self::PasswordResetFailed(_) => "Não foi possível redefinir sua senha.",
            Self::QueryFailed(_) => "Não foi possível realizar a consulta.",
            Self::CreateProductFailed(_) => "Não foi possível cadastrar.",
            Self::DeleteProductFailed(_) => "Não foi possível excluir o produto.",
            Self::DeliveryUpdateFailed(_) => "Não foi possível atualizar o pedido.",
            Self::PartialWrite {
                operation: PartialWriteOperation::ProductCreate,
                ..
            } => "Não foi possível cadastrar.",
            Self::PartialWrite {
                operation: PartialWriteOperation::ProductDelete,
                ..
            } => "Produto excluído, mas a foto não pôde ser removida.",
            Self::Storage(_) => "Não foi possível salvar a sessão.",
        }
    }
}
