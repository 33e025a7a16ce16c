// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use order::OrderApi;
use poem_openapi::{OpenApiService, Tags};

use crate::mailorder_version;
use crate::modules::settings::config::OrderConfig;

pub mod order;

#[derive(Tags)]
pub enum ApiTags {
    Order,
}

pub fn create_openapi_service(config: OrderConfig) -> OpenApiService<OrderApi, ()> {
    OpenApiService::new(OrderApi::new(config), "MailOrder API", mailorder_version!())
}
