//! Pipeline sink that pushes purchase-order records into the Sherpa
//! order-management service over its SOAP API, two calls per record:
//! `AddOrderedPurchase` then `ChangePurchase2`.
pub mod client;
pub mod config;
pub mod mapper;
pub mod model;
pub mod sink;
pub mod soap;
