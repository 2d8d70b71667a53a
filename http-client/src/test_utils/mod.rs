mod client;

pub(crate) use client::{
    capturing_caller, delayed_response_caller, error_caller, fake_caller, fixed_response_caller,
    sequence_caller, CapturedRequests,
};
