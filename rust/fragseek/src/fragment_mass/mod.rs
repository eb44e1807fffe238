pub mod ion_series;
pub mod model;

pub use ion_series::{
    IonKind,
    IonSeriesTerminality,
};
pub use model::{
    FragmentationModel,
    StandardIonSeries,
    TheoreticalFragment,
};
