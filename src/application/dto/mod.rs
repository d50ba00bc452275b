// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod call_query_request;
pub mod delivery_response;
pub mod webhook_request;
