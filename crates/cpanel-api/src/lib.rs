// cpanel-api: typed request builder, response parser and async client for cPanel UAPI

pub mod batch;
pub mod client;
pub mod encoder;
pub mod error;
pub mod headers;
pub mod params;
pub mod path;
pub mod request;
pub mod response;
pub mod rules;
pub mod transport;
pub mod uapi;

pub use batch::BatchRequest;
pub use client::{Credentials, UapiClient};
pub use encoder::{ArgumentEncoder, JsonArgumentEncoder, WwwFormUrlArgumentEncoder};
pub use error::Error;
pub use headers::{
    CpanelApiTokenHeader, Header, HeaderInput, HeaderKind, HeaderLiteral, Headers,
    WhmApiTokenHeader,
};
pub use params::{
    Argument, ArgumentInput, ArgumentLiteral, DEFAULT_PAGE_SIZE, Filter, FilterInput,
    FilterLiteral, FilterOperator, PageSize, Pager, PagerInput, PagerLiteral, Sort, SortDirection,
    SortInput, SortLiteral, SortType,
};
pub use path::{Application, ApplicationPath};
pub use request::{Request, RequestConfig, RequestInfo, RequestInit, RequestParts};
pub use response::{
    Message, MessageType, MetaData, Response, ResponseOptions, UapiMetaData, UapiResponse,
};
pub use rules::{ArgumentRule, ArgumentSerializationRules, DEFAULT_RULES, EncodingRule, HttpVerb};
pub use transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};
pub use uapi::UapiRequest;
