//! `tradeerp-customers`: customers, their addresses, engagement records and
//! user subscriptions.

pub mod customer;
pub mod engagement;
pub mod requests;
pub mod subscription;

pub use customer::{
    Address, AddressId, AddressType, Customer, CustomerChanges, CustomerId, CustomerStatus,
    CustomerType, NewAddress, NewCustomer,
};
pub use engagement::{
    CommunicationChannel, CommunicationDirection, CustomerCommunication, CustomerCommunicationId,
    CustomerSegment, CustomerSegmentId, CustomerStats, LoyaltyTransaction, LoyaltyTransactionId,
    LoyaltyType, NewCustomerCommunication, NewCustomerSegment, NewLoyaltyTransaction,
    SegmentCriterion, SegmentField, SegmentOperator,
};
pub use requests::*;
pub use subscription::{
    BillingCycle, NewUserSubscription, SubscriptionChanges, SubscriptionPlan, SubscriptionStatus,
    UserSubscription, UserSubscriptionId,
};
