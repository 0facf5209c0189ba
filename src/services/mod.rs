// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ai_response;
pub mod batch;
pub mod content_check;
pub mod flavor;
pub mod google_oidc;
pub mod identity;
pub mod llm;
pub mod mailer;
pub mod ordering;
pub mod otp;
pub mod password;
pub mod recipes;

pub use google_oidc::{GoogleIdentity, GoogleOidcVerifier, OidcError};
pub use identity::{establish_session, sign_in, GoogleSignIn, PasswordSignIn, Session, SignInStrategy};
pub use llm::{CompletionClient, OpenAiClient};
pub use mailer::{EmailMessage, HttpMailer, Mailer};
