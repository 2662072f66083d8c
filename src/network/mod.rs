// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interceptor pipeline and authentication rules

mod interceptor;
mod whitelist;

pub use interceptor::{
    AuthFailureHandler, BearerAuth, InterceptAction, InterceptorChain, RequestInterceptor,
    RequestLogger, TokenCapture,
};
pub use whitelist::{
    Whitelist, CHECK_PATH, DEFAULT_WHITELIST, LOGIN_PATH, REFRESH_PATH, REGISTER_PATH,
};
