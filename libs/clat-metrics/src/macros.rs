
/// A short-hand way to access one of the metrics in `clat_metrics::metrics`
#[macro_export]
macro_rules! metric {
    // Accept a name and multiple labels
    ($metric_name: ident, $($label_name: ident),+) => {
        $crate::metrics::$metric_name.with_label_values(&[$($crate::metrics::label_values::$label_name),+])
    };

}
