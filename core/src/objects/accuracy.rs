/// Geographic precision of a location query, as the service numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accuracy {
    World,
    Country,
    Region,
    City,
    #[default]
    Street,
}

impl Accuracy {
    pub fn value(self) -> u8 {
        match self {
            Accuracy::World => 1,
            Accuracy::Country => 3,
            Accuracy::Region => 6,
            Accuracy::City => 11,
            Accuracy::Street => 16,
        }
    }

    pub fn from_value(value: u8) -> Option<Accuracy> {
        [Accuracy::World, Accuracy::Country, Accuracy::Region, Accuracy::City, Accuracy::Street]
            .into_iter()
            .find(|accuracy| accuracy.value() == value)
    }
}
