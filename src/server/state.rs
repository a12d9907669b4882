use crate::geocode::AddressResolver;

pub struct AppState {
    pub resolver: AddressResolver,
}
